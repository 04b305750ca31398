use std::fmt;
use std::str::FromStr;

use smithay::utils::Transform;

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Outputs(pub Vec<OutputConfig>);

#[derive(knuffel::Decode, Debug, Clone, PartialEq)]
pub struct OutputConfig {
    #[knuffel(child)]
    pub off: bool,
    #[knuffel(argument)]
    pub name: String,
    #[knuffel(child, unwrap(argument))]
    pub scale: Option<f64>,
    #[knuffel(child, unwrap(argument, str), default)]
    pub transform: OutputTransform,
    #[knuffel(child)]
    pub position: Option<Position>,
}

#[derive(knuffel::Decode, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    #[knuffel(property)]
    pub x: i32,
    #[knuffel(property)]
    pub y: i32,
}

/// Output transform as written in the config.
///
/// Rotations are counter-clockwise, matching the wl_output convention.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum OutputTransform {
    #[default]
    Normal,
    _90,
    _180,
    _270,
    Flipped,
    Flipped90,
    Flipped180,
    Flipped270,
}

impl Outputs {
    pub fn find(&self, name: &str) -> Option<&OutputConfig> {
        self.0.iter().find(|o| o.name.eq_ignore_ascii_case(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = &OutputConfig> {
        self.0.iter()
    }
}

impl FromIterator<OutputConfig> for Outputs {
    fn from_iter<T: IntoIterator<Item = OutputConfig>>(iter: T) -> Self {
        Self(Vec::from_iter(iter))
    }
}

impl FromStr for OutputTransform {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(Self::Normal),
            "90" => Ok(Self::_90),
            "180" => Ok(Self::_180),
            "270" => Ok(Self::_270),
            "flipped" => Ok(Self::Flipped),
            "flipped-90" => Ok(Self::Flipped90),
            "flipped-180" => Ok(Self::Flipped180),
            "flipped-270" => Ok(Self::Flipped270),
            _ => Err(concat!(
                r#"invalid transform, can be "90", "180", "270", "#,
                r#""flipped", "flipped-90", "flipped-180" or "flipped-270""#
            )),
        }
    }
}

impl fmt::Display for OutputTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Normal => "normal",
            Self::_90 => "90",
            Self::_180 => "180",
            Self::_270 => "270",
            Self::Flipped => "flipped",
            Self::Flipped90 => "flipped-90",
            Self::Flipped180 => "flipped-180",
            Self::Flipped270 => "flipped-270",
        })
    }
}

impl From<OutputTransform> for Transform {
    fn from(value: OutputTransform) -> Self {
        match value {
            OutputTransform::Normal => Transform::Normal,
            OutputTransform::_90 => Transform::_90,
            OutputTransform::_180 => Transform::_180,
            OutputTransform::_270 => Transform::_270,
            OutputTransform::Flipped => Transform::Flipped,
            OutputTransform::Flipped90 => Transform::Flipped90,
            OutputTransform::Flipped180 => Transform::Flipped180,
            OutputTransform::Flipped270 => Transform::Flipped270,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_names_round_trip() {
        let all = [
            OutputTransform::Normal,
            OutputTransform::_90,
            OutputTransform::_180,
            OutputTransform::_270,
            OutputTransform::Flipped,
            OutputTransform::Flipped90,
            OutputTransform::Flipped180,
            OutputTransform::Flipped270,
        ];

        let names: Vec<String> = all.iter().map(|t| t.to_string()).collect();
        insta::assert_snapshot!(
            names.join(" "),
            @"normal 90 180 270 flipped flipped-90 flipped-180 flipped-270"
        );

        for t in all {
            assert_eq!(t.to_string().parse::<OutputTransform>(), Ok(t));
        }
    }

    #[test]
    fn transform_converts_to_smithay() {
        assert_eq!(Transform::from(OutputTransform::_270), Transform::_270);
        assert_eq!(Transform::from(OutputTransform::default()), Transform::Normal);
    }
}
