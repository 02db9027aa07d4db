use chrono::Utc;
use mstrcore::model::{BoundingBox, Detection};
use rand::{rngs::StdRng, seq::SliceRandom, Rng};

const TARGET_TYPES: &[&str] = &[
    "vehicle",
    "person",
    "people",
    "building",
    "structure",
    "aircraft",
    "generic_object",
];

/// Synthetic detections for one file; between one and `max_per_file` targets.
pub fn synthesize_detections(rng: &mut StdRng, file_id: &str, max_per_file: usize) -> Vec<Detection> {
    let count = rng.gen_range(1..=max_per_file.max(1));
    (0..count)
        .map(|_| {
            let target_type = TARGET_TYPES.choose(rng).copied().unwrap_or("generic_object");
            let bounding_box = BoundingBox {
                x: rng.gen_range(0.0..0.9),
                y: rng.gen_range(0.0..0.9),
                width: rng.gen_range(0.02..0.1),
                height: rng.gen_range(0.02..0.1),
            };
            let mut detection =
                Detection::new(target_type, rng.gen_range(0.3..0.99), bounding_box);
            detection.id = Some(uuid::Uuid::new_v4().to_string());
            detection.file_id = Some(file_id.to_string());
            detection.timestamp = Some(Utc::now());
            detection
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn generator_respects_bounds() {
        let mut rng = StdRng::seed_from_u64(13);
        for _ in 0..50 {
            let detections = synthesize_detections(&mut rng, "f1", 4);
            assert!((1..=4).contains(&detections.len()));
            for detection in detections {
                assert!((0.3..0.99).contains(&detection.confidence));
                assert!(detection.bounding_box.x < 0.9);
                assert_eq!(detection.file_id.as_deref(), Some("f1"));
            }
        }
    }

    #[test]
    fn generator_is_deterministic_per_seed() {
        let mut first = StdRng::seed_from_u64(312);
        let mut second = StdRng::seed_from_u64(312);
        let a: Vec<(String, f64)> = synthesize_detections(&mut first, "f", 3)
            .into_iter()
            .map(|d| (d.target_type, d.confidence))
            .collect();
        let b: Vec<(String, f64)> = synthesize_detections(&mut second, "f", 3)
            .into_iter()
            .map(|d| (d.target_type, d.confidence))
            .collect();
        assert_eq!(a, b);
    }

    #[test]
    fn zero_maximum_still_yields_one_detection() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(synthesize_detections(&mut rng, "f", 0).len(), 1);
    }
}
