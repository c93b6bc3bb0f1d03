//! Point cloud conversion

use contracts::{Header, PixelFormat, PointCloudMessage, PointField, PointFieldType, RawImage};
use tracing::error;

use crate::image::layout;
use crate::kind;

/// Bytes per point: x, y, z as 32-bit floats
pub const POINT_STEP: u32 = 12;

fn xyz_fields() -> Vec<PointField> {
    ["x", "y", "z"]
        .into_iter()
        .zip([0, 4, 8])
        .map(|(name, offset)| PointField {
            name: name.to_string(),
            offset,
            datatype: PointFieldType::Float32,
            count: 1,
        })
        .collect()
}

/// Convert a cartesian sub-image into a dense xyz cloud
pub fn to_point_cloud(source: &RawImage, header: &Header) -> PointCloudMessage {
    let mut result = PointCloudMessage::empty(header.clone(), source.width, source.height);

    if source.is_empty() {
        return result;
    }

    if !matches!(
        source.format(),
        Some(PixelFormat::Format32F3 | PixelFormat::Format32F)
    ) {
        error!(
            format_code = source.format_code,
            "unsupported pixel format for point cloud"
        );
        observability::record_conversion_rejected(kind::CLOUD);
        return result;
    }

    let Some((row_step, len)) = layout(source.width, source.height, POINT_STEP)
        .filter(|(_, len)| *len <= source.data.len())
    else {
        error!(
            width = source.width,
            height = source.height,
            available = source.data.len(),
            "point data shorter than its dimensions"
        );
        observability::record_conversion_rejected(kind::CLOUD);
        return result;
    };

    result.fields = xyz_fields();
    result.point_step = POINT_STEP;
    result.row_step = row_step;
    result.is_dense = true;
    result.data = source.data.slice(..len);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use chrono::Utc;

    fn xyz(width: u32, height: u32) -> RawImage {
        let points: Vec<[f32; 3]> = (0..width * height)
            .map(|i| [i as f32, 0.5, -1.0])
            .collect();
        RawImage::new(
            width,
            height,
            PixelFormat::Format32F3,
            Bytes::copy_from_slice(bytemuck::cast_slice(&points)),
        )
    }

    #[test]
    fn test_cloud_layout() {
        let header = Header::new("cam_link", Utc::now());
        let msg = to_point_cloud(&xyz(100, 100), &header);

        assert_eq!(msg.data.len(), 12 * 100 * 100);
        assert_eq!(msg.point_step, 12);
        assert_eq!(msg.row_step, 1200);
        assert!(msg.is_dense);
        assert!(!msg.is_bigendian);
        assert_eq!(msg.header, header);

        let offsets: Vec<(&str, u32)> = msg
            .fields
            .iter()
            .map(|f| (f.name.as_str(), f.offset))
            .collect();
        assert_eq!(offsets, vec![("x", 0), ("y", 4), ("z", 8)]);
        assert!(msg
            .fields
            .iter()
            .all(|f| f.datatype == PointFieldType::Float32 && f.count == 1));
    }

    #[test]
    fn test_cloud_preserves_points() {
        let msg = to_point_cloud(&xyz(3, 1), &Header::new("cam_link", Utc::now()));
        let third: [f32; 3] = bytemuck::pod_read_unaligned(&msg.data[24..36]);
        assert_eq!(third, [2.0, 0.5, -1.0]);
    }

    #[test]
    fn test_cloud_rejects_planar_format() {
        let source = RawImage::new(2, 2, PixelFormat::Format16U, vec![0u8; 8]);
        let msg = to_point_cloud(&source, &Header::new("cam_link", Utc::now()));
        assert!(msg.fields.is_empty());
        assert!(msg.data.is_empty());
        assert!(!msg.is_dense);
        assert_eq!((msg.width, msg.height), (2, 2));
    }

    #[test]
    fn test_cloud_empty_source() {
        let source = RawImage {
            width: 10,
            height: 10,
            format_code: 42,
            data: Bytes::new(),
        };
        let msg = to_point_cloud(&source, &Header::new("cam_link", Utc::now()));
        assert_eq!((msg.width, msg.height), (10, 10));
        assert!(msg.data.is_empty());
    }

    #[test]
    fn test_cloud_truncated_source() {
        let mut source = xyz(4, 4);
        source.data = source.data.slice(..100);
        let msg = to_point_cloud(&source, &Header::new("cam_link", Utc::now()));
        assert!(msg.data.is_empty());
        assert!(msg.fields.is_empty());
    }
}
