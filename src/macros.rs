/// Helper macro for reading locked state
///
/// Panics on a poisoned lock; backend state guards never hold across panics.
///
/// ```rust, ignore
///  let state = read_lock!(self.state);
///  println!("{}", state.current_size);
/// ```
macro_rules! read_lock {
    ($rwlock:expr) => {
        $rwlock.read().expect("Failed to acquire read lock")
    };
}

/// Helper macro for writing to locked state
///
/// ```rust, ignore
///  let mut state = write_lock!(self.state);
///  state.current_size += 1;
/// ```
macro_rules! write_lock {
    ($rwlock:expr) => {
        $rwlock.write().expect("Failed to acquire write lock")
    };
}
