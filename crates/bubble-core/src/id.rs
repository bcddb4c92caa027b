use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Stable identifier of a bubble in the scene graph.
/// Plain integer, 8 bytes, Copy + Eq + Hash + Ord.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BubbleId(pub u64);

impl BubbleId {
    pub const fn new(raw: u64) -> Self {
        BubbleId(raw)
    }

    pub const fn get(self) -> u64 {
        self.0
    }

    /// Parse an id stored as text (hyperlink targets, legacy records).
    pub fn parse(s: &str) -> Option<Self> {
        s.trim().parse::<u64>().ok().map(BubbleId)
    }

    /// Deterministic per-id phase for the outline noise, in `[0, 1000)`.
    /// Used when a bubble is rebuilt from a record and has no random seed.
    pub fn noise_phase(self) -> f32 {
        (self.0.wrapping_mul(2_654_435_761) % 1000) as f32
    }
}

impl fmt::Debug for BubbleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl fmt::Display for BubbleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl Serialize for BubbleId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.0)
    }
}

struct BubbleIdVisitor;

impl Visitor<'_> for BubbleIdVisitor {
    type Value = BubbleId;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a non-negative integer id or a numeric string")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<BubbleId, E> {
        Ok(BubbleId(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<BubbleId, E> {
        u64::try_from(v)
            .map(BubbleId)
            .map_err(|_| E::custom(format!("negative bubble id {v}")))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<BubbleId, E> {
        // Timestamp ids written by JS arrive as floats with no fraction.
        if v >= 0.0 && v.fract() == 0.0 && v <= u64::MAX as f64 {
            Ok(BubbleId(v as u64))
        } else {
            Err(E::custom(format!("invalid bubble id {v}")))
        }
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<BubbleId, E> {
        BubbleId::parse(v).ok_or_else(|| E::custom(format!("invalid bubble id {v:?}")))
    }
}

impl<'de> Deserialize<'de> for BubbleId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(BubbleIdVisitor)
    }
}
