// config.rs — 命令行 / 环境变量配置

use clap::Parser;
use log::warn;
use pano_sphere::ViewMode;
use std::path::PathBuf;

pub const DEFAULT_SLICES: usize = 200;
pub const DEFAULT_LANG: &str = "zh-Hans";
pub const SENSITIVITY_RANGE: std::ops::RangeInclusive<f32> = 0.1..=5.0;

#[derive(Parser, Debug)]
#[command(name = "pano-sphere")]
#[command(about = "Equirectangular panorama viewer (sphere / pano / asteroid)")]
pub struct Args {
    /// Longitudinal subdivisions of the sphere mesh (even, >= 4)
    #[arg(long, default_value_t = DEFAULT_SLICES)]
    pub slices: usize,

    #[arg(long, default_value_t = 1.0)]
    pub radius: f32,

    /// sphere | pano | asteroid
    #[arg(short, long, default_value_t = ViewMode::Sphere)]
    pub mode: ViewMode,

    #[arg(long, env = "PANORAMA_LANG", default_value = DEFAULT_LANG)]
    pub lang: String,

    /// Panorama to open at startup
    #[arg(short, long)]
    pub image: Option<PathBuf>,

    /// Multiplier on the drag rotation speed
    #[arg(long, default_value_t = 1.0)]
    pub sensitivity: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewerConfig {
    pub slices: usize,
    pub radius: f32,
    pub mode: ViewMode,
    pub lang: String,
    pub image: Option<PathBuf>,
    pub sensitivity: f32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            slices: DEFAULT_SLICES,
            radius: 1.0,
            mode: ViewMode::Sphere,
            lang: DEFAULT_LANG.to_string(),
            image: None,
            sensitivity: 1.0,
        }
    }
}

impl From<Args> for ViewerConfig {
    fn from(args: Args) -> Self {
        let sensitivity = if args.sensitivity.is_finite() {
            args.sensitivity
                .clamp(*SENSITIVITY_RANGE.start(), *SENSITIVITY_RANGE.end())
        } else {
            1.0
        };
        if sensitivity != args.sensitivity {
            warn!(
                "sensitivity {} out of range, using {}",
                args.sensitivity, sensitivity
            );
        }

        let lang = if args.lang.trim().is_empty() {
            DEFAULT_LANG.to_string()
        } else {
            args.lang
        };

        Self {
            slices: args.slices,
            radius: args.radius,
            mode: args.mode,
            lang,
            image: args.image,
            sensitivity,
        }
    }
}

impl ViewerConfig {
    pub fn from_args() -> Self {
        Args::parse().into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> ViewerConfig {
        Args::try_parse_from(argv).unwrap().into()
    }

    #[test]
    fn test_defaults() {
        let cfg = parse(&["pano-sphere", "--lang", "zh-Hans"]);
        assert_eq!(cfg, ViewerConfig::default());
    }

    #[test]
    fn test_mode_and_mesh_flags() {
        let cfg = parse(&[
            "pano-sphere",
            "--mode",
            "asteroid",
            "--slices",
            "64",
            "--radius",
            "2.5",
            "--lang",
            "en",
            "-i",
            "pano.jpg",
        ]);
        assert_eq!(cfg.mode, ViewMode::Asteroid);
        assert_eq!(cfg.slices, 64);
        assert_eq!(cfg.radius, 2.5);
        assert_eq!(cfg.lang, "en");
        assert_eq!(cfg.image, Some(PathBuf::from("pano.jpg")));
    }

    #[test]
    fn test_unknown_mode_rejected() {
        assert!(Args::try_parse_from(["pano-sphere", "--mode", "fisheye"]).is_err());
    }

    #[test]
    fn test_sensitivity_clamped() {
        let cfg = parse(&["pano-sphere", "--lang", "en", "--sensitivity", "9"]);
        assert_eq!(cfg.sensitivity, 5.0);
    }
}
