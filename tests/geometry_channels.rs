//! Geometry and animation decoding through an archive.

use scenepak::anim::{KeyframeBuffer, KeyframeProperty, PackingType};
use scenepak::codec::index::encode_delta;
use scenepak::codec::{decode_quaternion, keyframe};
use scenepak::prelude::*;
use scenepak::util::{Quat, Vec3, Vec4};

fn le<T: Copy, const N: usize>(values: &[T], to_bytes: fn(T) -> [u8; N]) -> Vec<u8> {
    values.iter().flat_map(|&v| to_bytes(v)).collect()
}

#[test]
fn test_triangle_strip_mesh() {
    // strip of two triangles, positions stored raw in int16
    let indices = [0u32, 1, 2, 3];
    let positions = [0i16, 0, 0, 10, 0, 0, 0, 10, 0, 0, 0, 0];
    let normals = [2u16, 2, 2, 2, 2, 2, 4, 2];

    let meta = r#"{
        "vertexCount": 4,
        "index": { "record": "strip.idx", "elementType": "uint16", "passes": { "delta": true } },
        "attributes": [
            { "name": "position", "record": "strip.pos", "elementType": "int16",
              "encoding": "predictive", "bboxMin": [0, 0, 0], "scaleStep": [0.1, 0.1, 0.1] },
            { "name": "normal", "record": "strip.nrm", "elementType": "uint16",
              "encoding": "octahedral" },
            { "name": "tangent", "record": "strip.tan", "elementType": "int16",
              "encoding": "quantized" }
        ]
    }"#;

    let idx: Vec<u16> = encode_delta(&indices, 0).iter().map(|&v| v as u16).collect();
    let mut w = ArchiveWriter::new();
    w.add("strip.json", "application/json", meta.as_bytes(), true);
    w.add("strip.idx", "application/octet-stream", &le(&idx, u16::to_le_bytes), true);
    w.add("strip.pos", "application/octet-stream", &le(&positions, i16::to_le_bytes), true);
    w.add("strip.nrm", "application/octet-stream", &le(&normals, u16::to_le_bytes), false);
    // one vertex short
    w.add("strip.tan", "application/octet-stream", &le(&[0i16; 9], i16::to_le_bytes), false);
    let archive = Archive::open(&w.finish()).unwrap();

    let meta = GeometryMeta::from_record(archive.get("strip.json").unwrap()).unwrap();
    let mut session = DecodeSession::default();
    let (geometry, _) = decode_geometry(&archive, &meta, &mut session, WatermarkState::default());
    let geometry = geometry.unwrap();

    assert_eq!(geometry.indices, indices);
    let pos = geometry.channel("position").unwrap().to_vec3().unwrap();
    // vertex 3 predicted as 1 + 2 - 0
    assert!((pos[3] - Vec3::new(1.0, 1.0, 0.0)).length() < 1e-5);
    let nrm = geometry.channel("normal").unwrap().to_vec3().unwrap();
    for n in &nrm[..3] {
        assert!((*n - Vec3::Z).length() < 1e-6);
    }
    assert!((nrm[3] - Vec3::X).length() < 1e-6);
    assert!(geometry.channel("tangent").is_none());
}

#[test]
fn test_keyframe_clip() {
    // property header, then a reduced keyframe buffer with a repeated tick
    let header = [1u8, 2, 0, 0, 0, 0, 3, 0, 0, 0];
    let mut keys = Vec::new();
    for (value, tick) in [(0.0f32, 5u16), (1.0, 5), (2.0, 9)] {
        keys.extend_from_slice(&value.to_le_bytes());
        keys.extend_from_slice(&tick.to_le_bytes());
        keys.extend_from_slice(&[1, 128]);
    }
    let mut w = ArchiveWriter::new();
    w.add("clip.hdr", "application/octet-stream", &header, false);
    w.add("clip.keys", "application/octet-stream", &keys, true);
    let archive = Archive::open(&w.finish()).unwrap();

    let mut cursor = scenepak::util::ByteCursor::new(archive.get("clip.hdr").unwrap().bytes());
    let prop = KeyframeProperty::parse(&mut cursor).unwrap();
    assert_eq!(prop.packing_type, PackingType::Reduced);

    let session = DecodeSession::default();
    let frames = KeyframeBuffer::new(archive.get("clip.keys").unwrap().bytes())
        .read(&prop, session.config().tick_epsilon)
        .unwrap();
    let ticks: Vec<f32> = frames.iter().map(|k| k.tick).collect();
    assert_eq!(ticks[0], 5.0);
    assert!((ticks[1] - 5.001).abs() < 1e-6);
    assert_eq!(ticks[2], 9.0);
    assert_eq!(frames[2].value, 2.0);
}

#[test]
fn test_rotation_channels() {
    let mut session = DecodeSession::default();

    // direction table: quarter turn about +X at the equator
    let rots = session.decode_directions(&[360u16, 0, 2048]).unwrap();
    assert!((rots[0] * Vec3::Y - Vec3::Z).length() < 1e-4);

    // quaternion increments split across two streams
    let (first, acc) = decode_quaternion(
        &[0i8, 0, 0, 1],
        Vec4::ZERO,
        Vec4::ONE,
        keyframe::RotationAccumulator::default(),
    )
    .unwrap();
    assert_eq!(first[0], Quat::IDENTITY);
    let (second, _) = decode_quaternion(&[0i8, 0, 0, 0], Vec4::ZERO, Vec4::ONE, acc).unwrap();
    assert_eq!(second[0], Quat::IDENTITY);
}
