//! TLV type identifiers emitted by TI mmWave SDK demos.
//!
//! These are for display and lookup only. TLV payloads are never
//! interpreted by this crate.

/// Detected point cloud.
pub const DETECTED_POINTS: u32 = 1;

/// Range profile.
pub const RANGE_PROFILE: u32 = 2;

/// Noise floor profile.
pub const NOISE_PROFILE: u32 = 3;

/// Azimuth static heat map.
pub const AZIMUTH_STATIC_HEATMAP: u32 = 4;

/// Range-Doppler heat map.
pub const RANGE_DOPPLER_HEATMAP: u32 = 5;

/// Processing statistics.
pub const STATS: u32 = 6;

/// Per-point SNR/noise side information.
pub const DETECTED_POINTS_SIDE_INFO: u32 = 7;

/// Azimuth/elevation static heat map.
pub const AZIMUTH_ELEVATION_STATIC_HEATMAP: u32 = 8;

/// Temperature statistics.
pub const TEMPERATURE_STATS: u32 = 9;

/// Returns a human-readable name for a TLV type.
pub fn tlv_type_name(tlv_type: u32) -> &'static str {
    match tlv_type {
        DETECTED_POINTS => "DETECTED_POINTS",
        RANGE_PROFILE => "RANGE_PROFILE",
        NOISE_PROFILE => "NOISE_PROFILE",
        AZIMUTH_STATIC_HEATMAP => "AZIMUTH_STATIC_HEATMAP",
        RANGE_DOPPLER_HEATMAP => "RANGE_DOPPLER_HEATMAP",
        STATS => "STATS",
        DETECTED_POINTS_SIDE_INFO => "DETECTED_POINTS_SIDE_INFO",
        AZIMUTH_ELEVATION_STATIC_HEATMAP => "AZIMUTH_ELEVATION_STATIC_HEATMAP",
        TEMPERATURE_STATS => "TEMPERATURE_STATS",
        _ => "UNKNOWN",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_cover_known_range() {
        for id in DETECTED_POINTS..=TEMPERATURE_STATS {
            assert_ne!(tlv_type_name(id), "UNKNOWN");
        }
        assert_eq!(tlv_type_name(0), "UNKNOWN");
        assert_eq!(tlv_type_name(1010), "UNKNOWN");
    }
}
