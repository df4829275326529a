//! Geometry channels driven by JSON side tables.
//!
//! A side table names the records that hold a mesh's packed index stream
//! and attribute streams plus the quantization parameters of each:
//!
//! ```json
//! {
//!   "vertexCount": 4,
//!   "index": { "record": "mesh.idx", "elementType": "uint32",
//!              "passes": { "delta": true, "implicit": true, "watermark": true } },
//!   "attributes": [
//!     { "name": "position", "record": "mesh.pos", "elementType": "uint16",
//!       "itemSize": 3, "encoding": "predictive",
//!       "bboxMin": [-1, -1, -1], "scaleStep": [0.001, 0.001, 0.001] },
//!     { "name": "normal", "record": "mesh.nrm", "elementType": "uint8",
//!       "encoding": "octahedral" }
//!   ]
//! }
//! ```
//!
//! A broken attribute channel is warned about and skipped. A broken index
//! stream drops the whole mesh.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::archive::{Archive, ArchiveRecord};
use crate::codec::{decode_indices, decode_octahedral, decode_predictive, dequantize};
use crate::codec::{ImplicitPolicy, IndexPasses, WatermarkState};
use crate::core::DecodeSession;
use crate::util::{with_array, ElementType, Error, Result, TypedArray, Vec3};

/// How an attribute stream is stored.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AttributeEncoding {
    /// Values as stored, recast to float
    Raw,
    /// Linear quantization only
    #[default]
    Quantized,
    /// Parallelogram prediction, then linear quantization
    Predictive,
    /// Two octahedral components per unit vector
    Octahedral,
}

/// Index stream description.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexMeta {
    pub record: String,
    #[serde(default = "default_index_type")]
    pub element_type: ElementType,
    /// Falls back to the session configuration when absent
    #[serde(default)]
    pub passes: Option<IndexPasses>,
    #[serde(default)]
    pub policy: Option<ImplicitPolicy>,
}

fn default_index_type() -> ElementType {
    ElementType::Uint32
}

/// Attribute stream description.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeMeta {
    pub name: String,
    pub record: String,
    pub element_type: ElementType,
    #[serde(default = "default_item_size")]
    pub item_size: usize,
    #[serde(default)]
    pub encoding: AttributeEncoding,
    #[serde(default)]
    pub bbox_min: Vec<f32>,
    #[serde(default)]
    pub scale_step: Vec<f32>,
}

fn default_item_size() -> usize {
    3
}

impl AttributeMeta {
    /// Elements the stream must hold for `vertex_count` vertices.
    pub fn expected_len(&self, vertex_count: usize) -> Result<usize> {
        let per_vertex = match self.encoding {
            AttributeEncoding::Octahedral => 2,
            _ => self.item_size,
        };
        vertex_count.checked_mul(per_vertex).ok_or_else(|| {
            Error::metadata(format!(
                "attribute '{}': {} vertices of {} elements overflow",
                self.name, vertex_count, per_vertex
            ))
        })
    }

    /// Components per vertex after decoding.
    pub fn output_item_size(&self) -> usize {
        match self.encoding {
            AttributeEncoding::Octahedral => 3,
            _ => self.item_size,
        }
    }

    fn quantization(&self) -> (Vec<f32>, Vec<f32>) {
        let n = self.item_size;
        let min = if self.bbox_min.is_empty() { vec![0.0; n] } else { self.bbox_min.clone() };
        let step = if self.scale_step.is_empty() { vec![1.0; n] } else { self.scale_step.clone() };
        (min, step)
    }
}

/// Side table of one mesh.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeometryMeta {
    pub vertex_count: usize,
    pub index: IndexMeta,
    #[serde(default)]
    pub attributes: Vec<AttributeMeta>,
}

impl GeometryMeta {
    pub fn from_record(record: &ArchiveRecord) -> Result<Self> {
        record.json()
    }
}

/// One decoded attribute as a flat float array.
#[derive(Clone, Debug, PartialEq)]
pub struct Channel {
    pub item_size: usize,
    pub values: Vec<f32>,
}

impl Channel {
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len() / self.item_size.max(1)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Regroup a three-component channel.
    pub fn to_vec3(&self) -> Option<Vec<Vec3>> {
        (self.item_size == 3).then(|| self.values.chunks_exact(3).map(Vec3::from_slice).collect())
    }
}

/// Decoded mesh streams ready for scene assembly.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DecodedGeometry {
    pub vertex_count: usize,
    pub indices: Vec<u32>,
    pub channels: BTreeMap<String, Channel>,
}

impl DecodedGeometry {
    #[inline]
    pub fn channel(&self, name: &str) -> Option<&Channel> {
        self.channels.get(name)
    }
}

fn typed_record(archive: &Archive, name: &str, ty: ElementType) -> Result<TypedArray> {
    TypedArray::from_le_bytes(ty, archive.require(name)?.bytes())
}

/// Decode a mesh described by `meta`.
///
/// Returns `None` when the index stream cannot be decoded; the watermark
/// state is then returned unchanged.
pub fn decode_geometry(
    archive: &Archive,
    meta: &GeometryMeta,
    session: &mut DecodeSession,
    state: WatermarkState,
) -> (Option<DecodedGeometry>, WatermarkState) {
    let passes = meta.index.passes.unwrap_or(session.config().index_passes);
    let policy = meta.index.policy.unwrap_or(session.config().implicit_policy);

    let decoded = typed_record(archive, &meta.index.record, meta.index.element_type)
        .and_then(|stream| decode_indices(&stream.to_u32_vec(), passes, policy, state));
    let (indices, next_state) = match decoded {
        Ok(result) => result,
        Err(e) => {
            tracing::warn!(record = %meta.index.record, error = %e, "index decode failed, skipping mesh");
            return (None, state);
        }
    };

    let mut geometry = DecodedGeometry {
        vertex_count: meta.vertex_count,
        indices,
        channels: BTreeMap::new(),
    };

    for attr in &meta.attributes {
        match decode_attribute(archive, attr, meta.vertex_count, &geometry.indices) {
            Ok(channel) => {
                tracing::trace!(name = %attr.name, len = channel.len(), "attribute decoded");
                geometry.channels.insert(attr.name.clone(), channel);
            }
            Err(e @ Error::RecordNotFound(_)) => {
                session.warn_once(&format!("missing:{}", attr.record), || {
                    format!("attribute '{}' skipped: {}", attr.name, e)
                });
            }
            Err(e) => {
                tracing::warn!(name = %attr.name, error = %e, "attribute skipped");
            }
        }
    }

    tracing::debug!(
        vertices = geometry.vertex_count,
        indices = geometry.indices.len(),
        channels = geometry.channels.len(),
        "geometry decoded"
    );
    (Some(geometry), next_state)
}

/// Decode one attribute channel.
pub fn decode_attribute(
    archive: &Archive,
    attr: &AttributeMeta,
    vertex_count: usize,
    indices: &[u32],
) -> Result<Channel> {
    let mut array = typed_record(archive, &attr.record, attr.element_type)?;

    let expected = attr.expected_len(vertex_count)?;
    if array.len() != expected {
        return Err(Error::ArrayLengthMismatch {
            channel: attr.name.clone(),
            expected,
            actual: array.len(),
        });
    }

    let item_size = attr.item_size;
    let values = match attr.encoding {
        AttributeEncoding::Raw => array.to_f32_vec(),
        AttributeEncoding::Quantized => {
            let (min, step) = attr.quantization();
            with_array!(&array, v => dequantize(v.as_slice(), item_size, &min, &step))?
        }
        AttributeEncoding::Predictive => {
            let (min, step) = attr.quantization();
            with_array!(&mut array, v => decode_predictive(indices, v.as_mut_slice(), item_size))?;
            with_array!(&array, v => dequantize(v.as_slice(), item_size, &min, &step))?
        }
        AttributeEncoding::Octahedral => {
            let normals = with_array!(&array, v => decode_octahedral(v.as_slice()))?;
            normals.iter().flat_map(|n| n.to_array()).collect()
        }
    };

    Ok(Channel { item_size: attr.output_item_size(), values })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::ArchiveWriter;
    use crate::codec::index::encode_delta;

    fn le_u16(values: &[u16]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    fn le_u32(values: &[u32]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    fn meta_json() -> &'static str {
        r#"{
            "vertexCount": 4,
            "index": { "record": "quad.idx", "passes": { "delta": true } },
            "attributes": [
                { "name": "position", "record": "quad.pos", "elementType": "uint16",
                  "encoding": "predictive", "bboxMin": [-1, -1, 0], "scaleStep": [0.5, 0.5, 1] },
                { "name": "normal", "record": "quad.nrm", "elementType": "uint8",
                  "encoding": "octahedral" },
                { "name": "uv", "record": "quad.uv", "elementType": "float32",
                  "itemSize": 2, "encoding": "raw" },
                { "name": "color", "record": "quad.col", "elementType": "uint8",
                  "itemSize": 4 }
            ]
        }"#
    }

    fn quad_archive(positions: &[u16], uv_len: usize) -> Archive {
        let indices = [0u32, 1, 2, 3];
        let normals = [4u8, 4, 4, 4, 4, 4, 8, 4];
        let uv: Vec<u8> = (0..uv_len).flat_map(|i| (i as f32).to_le_bytes()).collect();

        let mut w = ArchiveWriter::new();
        w.add("quad.json", "application/json", meta_json().as_bytes(), false);
        w.add("quad.idx", "application/octet-stream", &le_u32(&encode_delta(&indices, 0)), true);
        w.add("quad.pos", "application/octet-stream", &le_u16(positions), true);
        w.add("quad.nrm", "application/octet-stream", &normals, false);
        w.add("quad.uv", "application/octet-stream", &uv, false);
        Archive::open(&w.finish()).unwrap()
    }

    #[test]
    fn test_meta_from_json() {
        let meta: GeometryMeta = serde_json::from_str(meta_json()).unwrap();
        assert_eq!(meta.vertex_count, 4);
        assert_eq!(meta.index.element_type, ElementType::Uint32);
        assert_eq!(meta.attributes[0].encoding, AttributeEncoding::Predictive);
        assert_eq!(meta.attributes[0].item_size, 3);
        assert_eq!(meta.attributes[3].encoding, AttributeEncoding::Quantized);
        assert_eq!(meta.attributes[1].expected_len(4).unwrap(), 8);
    }

    #[test]
    fn test_decode_quad() {
        // vertex 3 stored as residual against 1 + 2 - 0
        let truth = [0u16, 0, 0, 2, 0, 0, 0, 2, 0, 2, 2, 0];
        let mut stored = truth;
        for c in 0..3 {
            stored[9 + c] = truth[9 + c]
                .wrapping_sub(truth[3 + c].wrapping_add(truth[6 + c]).wrapping_sub(truth[c]));
        }
        let archive = quad_archive(&stored, 8);
        let meta = GeometryMeta::from_record(archive.get("quad.json").unwrap()).unwrap();
        let mut session = DecodeSession::default();

        let (geometry, _) = decode_geometry(&archive, &meta, &mut session, WatermarkState::default());
        let geometry = geometry.unwrap();
        assert_eq!(geometry.indices, vec![0, 1, 2, 3]);

        let positions = geometry.channel("position").unwrap().to_vec3().unwrap();
        assert_eq!(positions[3], Vec3::new(0.0, 0.0, 0.0));
        assert_eq!(positions[0], Vec3::new(-1.0, -1.0, 0.0));

        let normals = geometry.channel("normal").unwrap().to_vec3().unwrap();
        assert_eq!(normals.len(), 4);
        assert!((normals[0] - Vec3::Z).length() < 1e-6);
        assert!((normals[3] - Vec3::X).length() < 1e-6);

        let uv = geometry.channel("uv").unwrap();
        assert_eq!(uv.item_size, 2);
        assert_eq!(uv.values[7], 7.0);

        // color record is missing: warned once, other channels kept
        assert!(geometry.channel("color").is_none());
        assert_eq!(session.warning_count(), 1);
        decode_geometry(&archive, &meta, &mut session, WatermarkState::default());
        assert_eq!(session.warning_count(), 1);
    }

    #[test]
    fn test_length_mismatch_skips_channel() {
        let archive = quad_archive(&[0u16; 12], 5);
        let meta: GeometryMeta = serde_json::from_str(meta_json()).unwrap();
        let err = decode_attribute(&archive, &meta.attributes[2], 4, &[0, 1, 2, 3]).unwrap_err();
        assert!(matches!(err, Error::ArrayLengthMismatch { expected: 8, actual: 5, .. }));

        let mut session = DecodeSession::default();
        let (geometry, _) = decode_geometry(&archive, &meta, &mut session, WatermarkState::default());
        let geometry = geometry.unwrap();
        assert!(geometry.channel("uv").is_none());
        assert!(geometry.channel("position").is_some());
        assert!(geometry.channel("normal").is_some());
    }

    #[test]
    fn test_vertex_count_overflow_skips_channel() {
        let archive = quad_archive(&[0u16; 12], 8);
        let meta: GeometryMeta = serde_json::from_str(meta_json()).unwrap();
        let position = &meta.attributes[0];
        assert!(matches!(position.expected_len(usize::MAX / 2), Err(Error::InvalidMetadata(_))));
        assert!(meta.attributes[1].expected_len(usize::MAX).is_err());

        let err = decode_attribute(&archive, position, usize::MAX / 2, &[0, 1, 2, 3]).unwrap_err();
        assert!(matches!(err, Error::InvalidMetadata(_)));
    }

    #[test]
    fn test_bad_index_stream_drops_mesh() {
        let mut w = ArchiveWriter::new();
        w.add("m.idx", "application/octet-stream", &le_u32(&[9, 0, 0]), false);
        let archive = Archive::open(&w.finish()).unwrap();
        let meta = GeometryMeta {
            vertex_count: 3,
            index: IndexMeta {
                record: "m.idx".into(),
                element_type: ElementType::Uint32,
                passes: Some(IndexPasses { implicit: true, ..IndexPasses::NONE }),
                policy: None,
            },
            attributes: Vec::new(),
        };
        let mut session = DecodeSession::default();
        let start = WatermarkState::new(3);
        let (geometry, state) = decode_geometry(&archive, &meta, &mut session, start);
        assert!(geometry.is_none());
        assert_eq!(state, start);
    }

    #[test]
    fn test_watermark_state_threads_between_meshes() {
        let mut w = ArchiveWriter::new();
        // two meshes sharing one counter: [0, 1, 2] then [1, 2, 3]
        w.add("a.idx", "application/octet-stream", &le_u32(&[0, 0, 0]), false);
        w.add("b.idx", "application/octet-stream", &le_u32(&[2, 1, 0]), false);
        let archive = Archive::open(&w.finish()).unwrap();

        let meta = |record: &str| GeometryMeta {
            vertex_count: 4,
            index: IndexMeta {
                record: record.into(),
                element_type: ElementType::Uint32,
                passes: Some(IndexPasses { watermark: true, ..IndexPasses::NONE }),
                policy: None,
            },
            attributes: Vec::new(),
        };
        let mut session = DecodeSession::default();
        let (a, state) = decode_geometry(&archive, &meta("a.idx"), &mut session, WatermarkState::default());
        let (b, state) = decode_geometry(&archive, &meta("b.idx"), &mut session, state);
        assert_eq!(a.unwrap().indices, vec![0, 1, 2]);
        assert_eq!(b.unwrap().indices, vec![1, 2, 3]);
        assert_eq!(state.magic(), 4);
    }
}
