//! Object-detection feed consumed by the dashboard.
//!
//! Only a randomized source exists today; a real inference backend plugs in
//! by implementing [`DetectionSource`]. Nothing here touches the coordination
//! engine.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Object classes the feed reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectClass {
    Car,
    Bus,
    Truck,
    Motorcycle,
    Bicycle,
    Pedestrian,
}

impl ObjectClass {
    pub const ALL: [ObjectClass; 6] = [
        ObjectClass::Car,
        ObjectClass::Bus,
        ObjectClass::Truck,
        ObjectClass::Motorcycle,
        ObjectClass::Bicycle,
        ObjectClass::Pedestrian,
    ];

    pub fn is_vehicle(self) -> bool {
        matches!(
            self,
            ObjectClass::Car | ObjectClass::Bus | ObjectClass::Truck | ObjectClass::Motorcycle
        )
    }

    /// Plausible speed range in km/h.
    fn speed_range(self) -> (f64, f64) {
        match self {
            ObjectClass::Car => (20.0, 90.0),
            ObjectClass::Bus => (15.0, 60.0),
            ObjectClass::Truck => (15.0, 70.0),
            ObjectClass::Motorcycle => (20.0, 100.0),
            ObjectClass::Bicycle => (8.0, 30.0),
            ObjectClass::Pedestrian => (2.0, 7.0),
        }
    }
}

/// Axis-aligned box in frame coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub class: ObjectClass,
    /// 0.0..=1.0
    pub confidence: f64,
    pub bbox: BoundingBox,
    pub speed_kmh: f64,
}

/// Anything that can produce a frame's worth of detections.
pub trait DetectionSource {
    fn poll(&mut self) -> Vec<Detection>;
}

/// Generates plausible-looking detections inside a fixed frame.
pub struct RandomDetectionSource {
    rng: SmallRng,
    frame_width: f64,
    frame_height: f64,
    max_per_frame: usize,
}

impl RandomDetectionSource {
    pub fn new(seed: u64, frame_width: f64, frame_height: f64, max_per_frame: usize) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
            frame_width: frame_width.max(1.0),
            frame_height: frame_height.max(1.0),
            max_per_frame,
        }
    }
}

impl DetectionSource for RandomDetectionSource {
    fn poll(&mut self) -> Vec<Detection> {
        let count = self.rng.random_range(0..=self.max_per_frame);
        (0..count)
            .map(|_| {
                let class = ObjectClass::ALL[self.rng.random_range(0..ObjectClass::ALL.len())];
                let width = self.rng.random_range(0.05..0.25) * self.frame_width;
                let height = self.rng.random_range(0.05..0.25) * self.frame_height;
                let (min_speed, max_speed) = class.speed_range();
                Detection {
                    class,
                    confidence: self.rng.random_range(0.5..1.0),
                    bbox: BoundingBox {
                        x: self.rng.random_range(0.0..(self.frame_width - width)),
                        y: self.rng.random_range(0.0..(self.frame_height - height)),
                        width,
                        height,
                    },
                    speed_kmh: self.rng.random_range(min_speed..max_speed),
                }
            })
            .collect()
    }
}

/// Number of motor vehicles in a frame.
pub fn count_vehicles(detections: &[Detection]) -> usize {
    detections.iter().filter(|d| d.class.is_vehicle()).count()
}
