use crate::model::Modality;

/// Maps a filename to its sensor modality by lowercase extension.
///
/// Total and side-effect free: names without an extension, or with one not
/// listed here, classify as [`Modality::Other`].
pub fn classify_modality(filename: &str) -> Modality {
    let extension = match filename.rsplit_once('.') {
        Some((_, ext)) => ext.to_ascii_lowercase(),
        None => return Modality::Other,
    };
    match extension.as_str() {
        "jpg" | "jpeg" | "png" | "bmp" => Modality::Rgb,
        "tif" | "tiff" => Modality::Thermal,
        "raw" | "bin" => Modality::Radar,
        _ => Modality::Other,
    }
}
