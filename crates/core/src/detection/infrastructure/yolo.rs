//! Pre- and post-processing shared by the YOLO face and person detectors.

use crate::shared::frame::Frame;

/// Fallback YOLO model input resolution when the model doesn't specify dimensions.
pub const DEFAULT_INPUT_SIZE: u32 = 640;

/// NMS IoU threshold.
pub const NMS_IOU_THRESH: f64 = 0.45;

/// How a frame was fitted into the square model input.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Letterbox {
    pub scale: f64,
    pub pad_x: u32,
    pub pad_y: u32,
}

impl Letterbox {
    /// Maps a model-space `(cx, cy, w, h)` box back to frame `[x1, y1, x2, y2]`.
    pub fn unmap(&self, cx: f64, cy: f64, w: f64, h: f64) -> [f64; 4] {
        let px = self.pad_x as f64;
        let py = self.pad_y as f64;
        [
            ((cx - w / 2.0) - px) / self.scale,
            ((cy - h / 2.0) - py) / self.scale,
            ((cx + w / 2.0) - px) / self.scale,
            ((cy + h / 2.0) - py) / self.scale,
        ]
    }
}

/// Letterbox-resize a frame to `target_size` × `target_size`.
///
/// Returns an NCHW float32 tensor in `[0, 1]`, padded with YOLO gray.
pub fn letterbox(frame: &Frame, target_size: u32) -> (ndarray::Array4<f32>, Letterbox) {
    let fw = frame.width() as f64;
    let fh = frame.height() as f64;
    let target = target_size as f64;

    let scale = (target / fw).min(target / fh);
    let new_w = ((fw * scale).round() as u32).min(target_size);
    let new_h = ((fh * scale).round() as u32).min(target_size);
    let pad_x = (target_size - new_w) / 2;
    let pad_y = (target_size - new_h) / 2;

    let gray = 114.0f32 / 255.0;
    let mut tensor =
        ndarray::Array4::<f32>::from_elem((1, 3, target_size as usize, target_size as usize), gray);

    let src = frame.as_ndarray();
    let src_h = frame.height() as usize;
    let src_w = frame.width() as usize;

    // Nearest-neighbor resize into the padded area.
    for y in 0..new_h as usize {
        let src_y = ((y as f64 / scale) as usize).min(src_h - 1);
        for x in 0..new_w as usize {
            let src_x = ((x as f64 / scale) as usize).min(src_w - 1);
            let ty = pad_y as usize + y;
            let tx = pad_x as usize + x;
            for c in 0..3 {
                tensor[[0, c, ty, tx]] = src[[src_y, src_x, c]] as f32 / 255.0;
            }
        }
    }

    (
        tensor,
        Letterbox {
            scale,
            pad_x,
            pad_y,
        },
    )
}

/// Splits a `[1, A, B]` YOLO output into one row of features per anchor.
///
/// Exported models come either as `[1, features, anchors]` (transposed) or
/// `[1, anchors, features]`; the smaller axis is taken as features.
pub fn output_rows(shape: &[usize], data: &[f32]) -> Result<Vec<Vec<f32>>, String> {
    if shape.len() != 3 {
        return Err(format!("Unexpected YOLO output shape: {shape:?}"));
    }
    let transposed = shape[1] < shape[2];
    let (num_dets, num_feats) = if transposed {
        (shape[2], shape[1])
    } else {
        (shape[1], shape[2])
    };
    if data.len() < num_dets * num_feats {
        return Err(format!(
            "YOLO output holds {} values, shape {shape:?} needs {}",
            data.len(),
            num_dets * num_feats
        ));
    }

    Ok((0..num_dets)
        .map(|i| {
            if transposed {
                (0..num_feats).map(|f| data[f * num_dets + i]).collect()
            } else {
                data[i * num_feats..(i + 1) * num_feats].to_vec()
            }
        })
        .collect())
}

/// Runs `session` on a letterboxed `frame` and returns raw output rows.
pub fn infer_rows(
    session: &mut ort::session::Session,
    frame: &Frame,
    input_size: u32,
) -> Result<(Vec<Vec<f32>>, Letterbox), Box<dyn std::error::Error>> {
    let (input_tensor, letterbox) = letterbox(frame, input_size);
    let input_value = ort::value::Tensor::from_array(input_tensor)?;
    let outputs = session.run(ort::inputs![input_value])?;
    if outputs.len() == 0 {
        return Err("YOLO model produced no outputs".into());
    }
    let tensor = outputs[0].try_extract_array::<f32>()?;
    let data = tensor.as_slice().ok_or("Cannot get tensor slice")?;
    let rows = output_rows(tensor.shape(), data)?;
    Ok((rows, letterbox))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_letterbox_preserves_aspect_ratio() {
        // Scale = min(640/200, 640/100) = 3.2 → 640x320, padded 160 top and bottom.
        let frame = Frame::filled(200, 100, 3, 128);
        let (tensor, lb) = letterbox(&frame, 640);

        assert_eq!(tensor.shape(), &[1, 3, 640, 640]);
        assert_relative_eq!(lb.scale, 3.2);
        assert_eq!((lb.pad_x, lb.pad_y), (0, 160));
    }

    #[test]
    fn test_letterbox_values_normalized_and_padding_gray() {
        let frame = Frame::filled(100, 50, 3, 255);
        let (tensor, lb) = letterbox(&frame, 640);

        let y = lb.pad_y as usize + 1;
        assert_relative_eq!(tensor[[0, 0, y, 1]], 1.0);
        assert_relative_eq!(tensor[[0, 0, 0, 0]], 114.0 / 255.0);
    }

    #[test]
    fn test_unmap_inverts_letterbox() {
        let lb = Letterbox {
            scale: 2.0,
            pad_x: 0,
            pad_y: 100,
        };
        // A 40x60 frame box at (10, 20) sits at (20, 140)..(100, 260) in model space.
        let bbox = lb.unmap(60.0, 200.0, 80.0, 120.0);
        assert_eq!(bbox, [10.0, 20.0, 50.0, 80.0]);
    }

    #[test]
    fn test_output_rows_transposed_layout() {
        // [1, features=2, anchors=3]: feature-major.
        let data = [1.0, 2.0, 3.0, 10.0, 20.0, 30.0];
        let rows = output_rows(&[1, 2, 3], &data).unwrap();
        assert_eq!(rows, vec![vec![1.0, 10.0], vec![2.0, 20.0], vec![3.0, 30.0]]);
    }

    #[test]
    fn test_output_rows_row_major_layout() {
        // [1, anchors=3, features=2].
        let data = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let rows = output_rows(&[1, 3, 2], &data).unwrap();
        assert_eq!(rows, vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]]);
    }

    #[test]
    fn test_output_rows_rejects_bad_shape() {
        assert!(output_rows(&[1, 5], &[0.0; 5]).is_err());
        assert!(output_rows(&[1, 2, 4], &[0.0; 3]).is_err());
    }
}
