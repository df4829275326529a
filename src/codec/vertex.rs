//! Quantized vertex attribute reconstruction.
//!
//! Attributes are stored as integer components predicted from neighbouring
//! triangle corners (parallelogram rule), then linearly quantized against a
//! per-axis bounding box.

use crate::util::{Element, Error, Result};

/// Undo parallelogram prediction in place.
///
/// `raw` holds `item_size` components per vertex. The first three indices
/// are taken as stored. Every window `[prev2, prev1, prev0, current]` of the
/// index stream whose `current` vertex has not been seen yet corrects it to
/// `raw[current] + raw[prev1] + raw[prev0] - raw[prev2]`, per component,
/// wrapping in the element width. Windows are processed in index order
/// since later corrections read earlier ones.
pub fn decode_predictive<T: Element>(indices: &[u32], raw: &mut [T], item_size: usize) -> Result<()> {
    if item_size == 0 || raw.len() % item_size != 0 {
        return Err(Error::out_of_bounds(format!(
            "{} components do not split into items of {}",
            raw.len(),
            item_size
        )));
    }
    let vertex_count = raw.len() / item_size;
    if let Some(&bad) = indices.iter().find(|&&i| i as usize >= vertex_count) {
        return Err(Error::out_of_bounds(format!(
            "index {} past {} vertices",
            bad, vertex_count
        )));
    }

    let mut seen = vec![false; vertex_count];
    for &i in indices.iter().take(3) {
        seen[i as usize] = true;
    }

    for window in indices.windows(4) {
        let [p2, p1, p0, cur] = [window[0], window[1], window[2], window[3]].map(|i| i as usize * item_size);
        let current = window[3] as usize;
        if seen[current] {
            continue;
        }
        seen[current] = true;
        for c in 0..item_size {
            raw[cur + c] = raw[cur + c]
                .add_wrapping(raw[p1 + c])
                .add_wrapping(raw[p0 + c])
                .sub_wrapping(raw[p2 + c]);
        }
    }
    Ok(())
}

/// Map integer components to floats: `min[axis] + raw * step[axis]`.
///
/// `bbox_min` and `scale_step` need one entry per component of an item.
pub fn dequantize<T: Element>(raw: &[T], item_size: usize, bbox_min: &[f32], scale_step: &[f32]) -> Result<Vec<f32>> {
    if bbox_min.len() < item_size || scale_step.len() < item_size {
        return Err(Error::metadata(format!(
            "quantization box has {}/{} axes for items of {}",
            bbox_min.len(),
            scale_step.len(),
            item_size
        )));
    }
    if item_size == 0 || raw.len() % item_size != 0 {
        return Err(Error::out_of_bounds(format!(
            "{} components do not split into items of {}",
            raw.len(),
            item_size
        )));
    }
    Ok(raw
        .iter()
        .enumerate()
        .map(|(i, v)| {
            let axis = i % item_size;
            bbox_min[axis] + v.to_f32() * scale_step[axis]
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_triangle_unchanged() {
        let mut raw: Vec<u16> = vec![1, 2, 3, 4, 5, 6, 7, 8, 9];
        decode_predictive(&[0, 1, 2], &mut raw, 3).unwrap();
        assert_eq!(raw, vec![1, 2, 3, 4, 5, 6, 7, 8, 9]);

        let out = dequantize(&raw, 3, &[0.0, 10.0, -1.0], &[0.5, 1.0, 2.0]).unwrap();
        assert_eq!(&out[..3], &[0.5, 12.0, 5.0]);
    }

    #[test]
    fn test_parallelogram_prediction() {
        // quad 0-1-2 / 1-2-3, vertex 3 stored as residual against 1 + 2 - 0
        let (v0, v1, v2, v3) = (10i32, 20, 15, 26);
        let predicted = v1 + v2 - v0;
        let mut raw = vec![v0, v1, v2, v3 - predicted];
        decode_predictive(&[0, 1, 2, 3], &mut raw, 1).unwrap();
        assert_eq!(raw, vec![v0, v1, v2, v3]);
    }

    #[test]
    fn test_prediction_reuses_corrected_values() {
        let truth = [0i16, 4, 2, 6, 9, -3];
        let indices = [0u32, 1, 2, 3, 4, 5];
        let mut raw = truth.to_vec();
        for w in (3..truth.len()).rev() {
            raw[w] = truth[w] - (truth[w - 2] + truth[w - 1] - truth[w - 3]);
        }
        decode_predictive(&indices, &mut raw, 1).unwrap();
        assert_eq!(raw, truth);
    }

    #[test]
    fn test_seen_vertices_not_corrected_twice() {
        let mut raw = vec![1u8, 2, 3, 4];
        // vertex 1 repeats as `current` of a later window
        decode_predictive(&[0, 1, 2, 3, 1], &mut raw, 1).unwrap();
        assert_eq!(raw, vec![1, 2, 3, 4 + 3 + 2 - 1]);
    }

    #[test]
    fn test_wraps_in_element_width() {
        let mut raw = vec![0u8, 200, 200, 0];
        decode_predictive(&[0, 1, 2, 3], &mut raw, 1).unwrap();
        assert_eq!(raw[3], 144); // 400 mod 256
    }

    #[test]
    fn test_out_of_range_index() {
        let mut raw = vec![0u16; 6];
        assert!(matches!(
            decode_predictive(&[0, 1, 2, 9], &mut raw, 3),
            Err(Error::HeaderOutOfBounds(_))
        ));
        assert!(decode_predictive(&[0], &mut raw, 4).is_err());
        assert!(decode_predictive(&[0], &mut raw, 0).is_err());
    }

    #[test]
    fn test_dequantize_per_axis() {
        let raw = [0u16, 0, 2, 4];
        let out = dequantize(&raw, 2, &[1.0, -1.0], &[0.25, 0.5]).unwrap();
        assert_eq!(out, vec![1.0, -1.0, 1.5, 1.0]);
        assert!(dequantize(&raw, 3, &[0.0; 2], &[1.0; 2]).is_err());
    }
}
