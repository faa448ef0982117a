use image::Rgba;

const ONE_THIRD: f32 = 1.0 / 3.0;
const ONE_SIXTH: f32 = 1.0 / 6.0;
const TWO_THIRDS: f32 = 2.0 / 3.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RgbColorFormat<T> {
    red: T,
    green: T,
    blue: T,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HlsColorFormat<T> {
    pub hue: T,
    pub lightness: T,
    pub saturation: T,
}

impl From<&Rgba<u8>> for RgbColorFormat<f32> {
    fn from(value: &Rgba<u8>) -> Self {
        RgbColorFormat {
            red: value[0] as f32 / 255.0,
            green: value[1] as f32 / 255.0,
            blue: value[2] as f32 / 255.0,
        }
    }
}

impl From<&RgbColorFormat<f32>> for HlsColorFormat<f32> {
    fn from(value: &RgbColorFormat<f32>) -> Self {
        let max_channel = value.red.max(value.green).max(value.blue);
        let min_channel = value.red.min(value.green).min(value.blue);
        let lightness = (max_channel + min_channel) / 2.0;
        if max_channel == min_channel {
            return HlsColorFormat {
                hue: 0.0,
                lightness,
                saturation: 0.0,
            };
        }
        let span = max_channel - min_channel;
        let saturation = if lightness <= 0.5 {
            span / (max_channel + min_channel)
        } else {
            span / (2.0 - max_channel - min_channel)
        };
        let red_distance = (max_channel - value.red) / span;
        let green_distance = (max_channel - value.green) / span;
        let blue_distance = (max_channel - value.blue) / span;
        let hue = if value.red == max_channel {
            blue_distance - green_distance
        } else if value.green == max_channel {
            2.0 + red_distance - blue_distance
        } else {
            4.0 + green_distance - red_distance
        };
        HlsColorFormat {
            hue: (hue / 6.0).rem_euclid(1.0),
            lightness,
            saturation,
        }
    }
}

impl From<&HlsColorFormat<f32>> for RgbColorFormat<f32> {
    fn from(value: &HlsColorFormat<f32>) -> Self {
        if value.saturation == 0.0 {
            return RgbColorFormat {
                red: value.lightness,
                green: value.lightness,
                blue: value.lightness,
            };
        }
        let upper = if value.lightness <= 0.5 {
            value.lightness * (1.0 + value.saturation)
        } else {
            value.lightness + value.saturation - value.lightness * value.saturation
        };
        let lower = 2.0 * value.lightness - upper;
        RgbColorFormat {
            red: channel_from_hue_ramp(lower, upper, value.hue + ONE_THIRD),
            green: channel_from_hue_ramp(lower, upper, value.hue),
            blue: channel_from_hue_ramp(lower, upper, value.hue - ONE_THIRD),
        }
    }
}

impl RgbColorFormat<f32> {
    /// Scales the normalized channels back to 8 bit values, truncating
    /// rather than rounding. A full round trip stays within one count
    /// per channel.
    pub fn to_bytes(&self) -> [u8; 3] {
        [
            (self.red * 255.0) as u8,
            (self.green * 255.0) as u8,
            (self.blue * 255.0) as u8,
        ]
    }
}

fn channel_from_hue_ramp(lower: f32, upper: f32, hue: f32) -> f32 {
    let hue = hue.rem_euclid(1.0);
    if hue < ONE_SIXTH {
        lower + (upper - lower) * hue * 6.0
    } else if hue < 0.5 {
        upper
    } else if hue < TWO_THIRDS {
        lower + (upper - lower) * (TWO_THIRDS - hue) * 6.0
    } else {
        lower
    }
}
