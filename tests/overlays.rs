//! Integration tests for typed access to a live target.
//!
//! This module exercises realistic inspection scenarios end-to-end: compile-time
//! fields over allocated memory, runtime layouts navigated by name, pointer
//! chains across allocations and forward references resolved through a registry.

use memscope::{prelude::*, Result};
use std::sync::Arc;

fn target() -> SharedBackend {
    SharedBackend::new(LocalBackend::new(0x0010_0000))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ThreadState {
    Ready = 0,
    Running = 1,
    Blocked = 2,
}

impl EnumRepr for ThreadState {
    type Raw = u32;
    const NAME: &'static str = "ThreadState";

    fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(Self::Ready),
            1 => Some(Self::Running),
            2 => Some(Self::Blocked),
            _ => None,
        }
    }

    fn to_raw(self) -> u32 {
        self as u32
    }
}

/// Test scalar fields at the edges of their value ranges.
#[test]
fn test_scalar_fields_roundtrip_at_the_boundaries() -> Result<()> {
    let mut heap = BaseAllocator::new(target());
    let view = heap.alloc0(0x20)?;

    view.overlay::<ScalarField<u8>>(0x0).write(u8::MAX)?;
    view.overlay::<ScalarField<i64>>(0x8).write(i64::MIN)?;
    view.overlay::<ScalarField<f64>>(0x10).write(std::f64::consts::PI)?;

    assert_eq!(view.overlay::<ScalarField<u8>>(0x0).read()?, u8::MAX);
    assert_eq!(view.overlay::<ScalarField<i64>>(0x8).read()?, i64::MIN);
    let pi = view.overlay::<ScalarField<f64>>(0x10).read()?;
    assert!((pi - std::f64::consts::PI).abs() < f64::EPSILON);

    // Little-endian on the wire.
    assert_eq!(view.read_bytes(8, 0x8)?, [0, 0, 0, 0, 0, 0, 0, 0x80]);
    Ok(())
}

/// Test a pointer slot linking two separate allocations.
#[test]
fn test_pointer_chains_across_allocations() -> Result<()> {
    let mut heap = BaseAllocator::new(target());
    let node = heap.alloc0(0x10)?;
    let payload = heap.alloc0(0x8)?;

    let slot: PointerField<ScalarField<u64>> = node.overlay(0);
    slot.write_address(payload.address())?;
    assert_eq!(slot.read_address()?, payload.address());

    payload.overlay::<ScalarField<u64>>(0).write(0xFEED_F00D)?;
    assert_eq!(slot.read()?.read()?, 0xFEED_F00D);
    Ok(())
}

/// Test that cast and cast_offset reinterpret without touching the target.
#[test]
fn test_casts_never_touch_the_target() -> Result<()> {
    let mut heap = BaseAllocator::new(target());
    let view = heap.alloc0(0x18)?;
    view.write_bytes(&[0x11; 0x18], 0)?;
    let before = view.read_bytes(0x18, 0)?;

    let slot: PointerField<ScalarField<u32>> = view.overlay(0x8);
    let _narrow = slot.cast::<ScalarField<u16>>();
    let _ahead = slot.cast_offset::<ScalarField<u32>>(4);
    let _behind = slot.cast_offset::<ScalarField<u32>>(-8);

    assert_eq!(view.read_bytes(0x18, 0)?, before);
    Ok(())
}

/// Test that writing a C string emits the text plus one terminator, nothing more.
#[test]
fn test_cstrings_write_length_plus_one() -> Result<()> {
    let mut heap = BaseAllocator::new(target());
    let view = heap.alloc0(0x10)?;
    view.write_bytes(&[0xFF; 0x10], 0)?;

    let name: CStringField = view.overlay(0);
    name.write("test")?;

    assert_eq!(view.read_bytes(6, 0)?, b"test\x00\xFF");
    assert_eq!(name.read()?, "test");
    Ok(())
}

/// Test UTF-16 text through a wide string field.
#[test]
fn test_wide_strings_roundtrip() -> Result<()> {
    let mut heap = BaseAllocator::new(target());
    let view = heap.alloc0(0x40)?;

    let title: WideStringField = view.overlay(4);
    title.write("memscope ☃")?;

    assert_eq!(title.read()?, "memscope ☃");
    // Two-byte units in little-endian order.
    assert_eq!(view.read_bytes(4, 4)?, [b'm', 0, b'e', 0]);
    Ok(())
}

/// Test enum fields mapping discriminants both ways.
#[test]
fn test_enum_fields_map_discriminants() -> Result<()> {
    let mut heap = BaseAllocator::new(target());
    let view = heap.alloc0(0x8)?;

    let state: EnumField<ThreadState> = view.overlay(0);
    state.write(ThreadState::Running)?;

    assert_eq!(view.read_bytes(4, 0)?, [1, 0, 0, 0]);
    assert_eq!(state.read()?, ThreadState::Running);

    // A discriminant outside the mapping is an error, not a default.
    state.raw().write(99)?;
    assert!(matches!(
        state.read(),
        Err(Error::UnknownVariant { value: 99, .. })
    ));
    Ok(())
}

/// Test a runtime layout read and written through field names.
#[test]
fn test_struct_overlays_read_and_write_by_name() -> Result<()> {
    let layout = StructLayout::builder("Player")
        .scalar("health", 0x0, ScalarKind::I32)
        .scalar("mana", 0x4, ScalarKind::I32)
        .cstring("name", 0x8)
        .build()?;

    let mut heap = BaseAllocator::new(target());
    let view = heap.alloc0(0x30)?;
    let player = view.overlay_layout(&layout, 0);

    player.field("health")?.write(&Value::I32(100))?;
    player.field("mana")?.write(&Value::I32(40))?;
    player.field("name")?.write(&Value::Str("rogue".into()))?;

    assert!(matches!(player.field("health")?.read(), Ok(Value::I32(100))));

    // The typed escape hatches reach the same bytes.
    assert_eq!(player.field("health")?.scalar::<i32>()?.read()?, 100);
    assert_eq!(player.field("name")?.cstring()?.read()?, "rogue");

    assert!(matches!(
        player.field("level"),
        Err(Error::UnknownField { .. })
    ));
    Ok(())
}

/// Test dumping a structure: every field in declaration order, formatted.
#[test]
fn test_struct_dumps_list_every_field() -> Result<()> {
    let layout = StructLayout::builder("Player")
        .scalar("health", 0x0, ScalarKind::I32)
        .scalar("mana", 0x4, ScalarKind::I32)
        .cstring("name", 0x8)
        .build()?;

    let mut heap = BaseAllocator::new(target());
    let view = heap.alloc0(0x30)?;
    let player = view.overlay_layout(&layout, 0);

    player.field("health")?.write(&Value::I32(100))?;
    player.field("mana")?.write(&Value::I32(40))?;
    player.field("name")?.write(&Value::Str("rogue".into()))?;

    let mut lines = Vec::new();
    for field in player.fields() {
        lines.push(format!("{}: {}", field.name(), field.read()?));
    }
    assert_eq!(lines, ["health: 100", "mana: 40", "name: \"rogue\""]);
    Ok(())
}

/// Test that a value of the wrong kind never reaches the target.
#[test]
fn test_value_writes_must_match_the_descriptor() -> Result<()> {
    let layout = StructLayout::builder("Player")
        .scalar("health", 0x0, ScalarKind::I32)
        .build()?;

    let mut heap = BaseAllocator::new(target());
    let view = heap.alloc0(0x8)?;
    let player = view.overlay_layout(&layout, 0);

    let result = player.field("health")?.write(&Value::U32(1));
    assert!(matches!(
        result,
        Err(Error::FieldMismatch {
            expected: "i32",
            found: "u32",
            ..
        })
    ));

    // The rejected write left the bytes alone.
    assert_eq!(view.read_bytes(4, 0)?, [0, 0, 0, 0]);
    Ok(())
}

/// Test nested layouts navigated through their parent.
#[test]
fn test_nested_layouts_compose() -> Result<()> {
    let stats = StructLayout::builder("Stats")
        .scalar("strength", 0x0, ScalarKind::U8)
        .scalar("agility", 0x1, ScalarKind::U8)
        .build()?;
    let unit = StructLayout::builder("Unit")
        .scalar("id", 0x0, ScalarKind::U32)
        .nested("stats", 0x8, stats)
        .build()?;

    let mut heap = BaseAllocator::new(target());
    let view = heap.alloc0(0x10)?;
    let overlay = view.overlay_layout(&unit, 0);

    let inner = overlay.field("stats")?.as_struct()?;
    assert_eq!(inner.address(), view.address() + 0x8);

    inner.field("agility")?.write(&Value::U8(17))?;
    assert_eq!(view.read_bytes(1, 0x9)?, [17]);

    // The parent field reads as a struct value and rejects leaf writes.
    assert!(matches!(
        overlay.field("stats")?.read(),
        Ok(Value::Struct(_))
    ));
    assert!(matches!(
        overlay.field("stats")?.write(&Value::U8(0)),
        Err(Error::FieldMismatch { found: "struct", .. })
    ));
    Ok(())
}

/// Test pointer descriptors dereferencing into a sibling allocation.
#[test]
fn test_pointer_descriptors_follow_to_their_target() -> Result<()> {
    let item = StructLayout::builder("Item")
        .scalar("price", 0x0, ScalarKind::U32)
        .build()?;
    let shelf = StructLayout::builder("Shelf")
        .pointer("top", 0x0, FieldDescriptor::Struct(item))
        .build()?;

    let mut heap = BaseAllocator::new(target());
    let shelf_view = heap.alloc0(0x10)?;
    let item_view = heap.alloc0(0x8)?;

    let overlay = shelf_view.overlay_layout(&shelf, 0);
    overlay.field("top")?.write_address(item_view.address())?;

    let target_field = overlay.field("top")?.deref()?;
    assert_eq!(target_field.address(), item_view.address());

    target_field.as_struct()?.field("price")?.write(&Value::U32(250))?;
    assert_eq!(item_view.read_bytes(4, 0)?, [250, 0, 0, 0]);

    match overlay.field("top")?.read()? {
        Value::Pointer { address, target } => {
            assert_eq!(address, item_view.address());
            assert!(matches!(target.read(), Ok(Value::Struct(_))));
        }
        other => panic!("expected pointer value, got {other}"),
    }
    Ok(())
}

/// Test enum descriptors writing by variant name.
#[test]
fn test_enum_descriptors_write_by_variant_name() -> Result<()> {
    let power = Arc::new(EnumDef::new("Power", ScalarKind::U8, &[("Off", 0), ("On", 1)]));
    let device = StructLayout::builder("Device")
        .enumeration("power", 0x0, power)
        .build()?;

    let mut heap = BaseAllocator::new(target());
    let view = heap.alloc0(0x4)?;
    let overlay = view.overlay_layout(&device, 0);

    overlay.field("power")?.write(&Value::Variant {
        name: "On".into(),
        value: 1,
    })?;
    assert_eq!(view.read_bytes(1, 0)?, [1]);

    match overlay.field("power")?.read()? {
        Value::Variant { name, value } => {
            assert_eq!(name, "On");
            assert_eq!(value, 1);
        }
        other => panic!("expected variant value, got {other}"),
    }

    assert_eq!(overlay.field("power")?.enum_def()?.name(), "Power");

    let unknown = overlay.field("power")?.write(&Value::Variant {
        name: "Standby".into(),
        value: 2,
    });
    assert!(matches!(unknown, Err(Error::UnknownVariantName { .. })));
    Ok(())
}

/// Test a self-referential layout resolved through a registry.
#[test]
fn test_registries_resolve_forward_references() -> Result<()> {
    let registry = LayoutRegistry::new();
    let node = StructLayout::builder("Node")
        .scalar("value", 0x0, ScalarKind::I64)
        .pointer("next", 0x8, FieldDescriptor::Lazy(registry.forward("Node")))
        .build()?;
    registry.register(node.clone())?;

    let mut heap = BaseAllocator::new(target());
    let head = heap.alloc0(0x10)?;
    let tail = heap.alloc0(0x10)?;

    let head_overlay = head.overlay_layout(&node, 0);
    head_overlay.field("value")?.write(&Value::I64(1))?;
    head_overlay.field("next")?.write_address(tail.address())?;

    let tail_overlay = tail.overlay_layout(&node, 0);
    tail_overlay.field("value")?.write(&Value::I64(2))?;

    let next = head_overlay.field("next")?.deref()?.as_struct()?;
    assert!(matches!(next.field("value")?.read(), Ok(Value::I64(2))));
    Ok(())
}

/// Test that forward references fail cleanly instead of resolving to nothing.
#[test]
fn test_unresolved_forward_references_fail() {
    let registry = LayoutRegistry::new();
    let pending = registry.forward("Ghost");

    assert!(!pending.is_resolved());
    assert!(matches!(
        pending.resolve(),
        Err(Error::UnresolvedLayout(_))
    ));

    let orphan = {
        let gone = LayoutRegistry::new();
        gone.forward("Node")
    };
    assert!(matches!(orphan.resolve(), Err(Error::RegistryGone)));
}

/// Test registry and builder name collisions.
#[test]
fn test_duplicate_names_are_rejected() -> Result<()> {
    let registry = LayoutRegistry::new();
    registry.register(
        StructLayout::builder("Session")
            .scalar("id", 0x0, ScalarKind::U64)
            .build()?,
    )?;

    let again = registry.register(StructLayout::builder("Session").build()?);
    assert!(matches!(again, Err(Error::DuplicateLayout(name)) if name == "Session"));

    let collision = StructLayout::builder("Pair")
        .scalar("x", 0x0, ScalarKind::I32)
        .scalar("x", 0x4, ScalarKind::I32)
        .build();
    assert!(matches!(collision, Err(Error::DuplicateField { .. })));
    Ok(())
}

/// Test stamping a configured overlay onto another view.
#[test]
fn test_prototypes_stamp_across_views() -> Result<()> {
    let layout = StructLayout::builder("Header")
        .scalar("magic", 0x0, ScalarKind::U32)
        .build()?;

    let mut heap = BaseAllocator::new(target());
    let first = heap.alloc0(0x10)?;
    let second = heap.alloc0(0x10)?;

    let proto = first.overlay_layout(&layout, 0);
    let stamped = second.overlay_from(&proto, 0x4);

    assert_eq!(stamped.name(), "Header");
    assert_eq!(stamped.address(), second.address() + 0x4);

    stamped.field("magic")?.write(&Value::U32(0xFACE))?;
    assert_eq!(second.read_bytes(2, 0x4)?, [0xCE, 0xFA]);
    Ok(())
}

/// Test that overlays never cache: two accessors over one address agree.
#[test]
fn test_overlays_share_bytes_without_caching() -> Result<()> {
    let mut heap = BaseAllocator::new(target());
    let view = heap.alloc0(0x8)?;

    let first = view.overlay::<ScalarField<u32>>(0);
    let second = view.overlay::<ScalarField<u32>>(0);

    first.write(7)?;
    assert_eq!(second.read()?, 7);
    second.write(9)?;
    assert_eq!(first.read()?, 9);
    Ok(())
}
