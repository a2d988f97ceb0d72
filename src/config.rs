//! Viewer configuration.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::camera::{NavigationBasis, NavigationConfig};
use crate::logging::LoggingConfig;
use crate::shadow::DEFAULT_DEPTH_BIAS;
use crate::texture::CubemapFaces;

/// Which renderer drives the frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Technique {
    /// Depth pass from the light, then a lit pass that samples it.
    #[default]
    ShadowMap,
    /// A single full-screen pass that traces rays per pixel.
    RayCast,
}

impl Technique {
    pub fn navigation_basis(self) -> NavigationBasis {
        match self {
            Self::ShadowMap => NavigationBasis::Raster,
            Self::RayCast => NavigationBasis::RayCast,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::ShadowMap => "shadow",
            Self::RayCast => "raycast",
        }
    }
}

impl FromStr for Technique {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "shadow" | "shadow-map" | "shadowmap" => Ok(Self::ShadowMap),
            "raycast" | "ray-cast" | "ray" => Ok(Self::RayCast),
            other => Err(format!(
                "unknown technique '{other}', expected 'shadow' or 'raycast'"
            )),
        }
    }
}

/// File names of the surface textures in the shadow-mapped scene.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SceneTextures {
    pub boxes: String,
    pub ground: String,
    pub orbiter: String,
}

impl Default for SceneTextures {
    fn default() -> Self {
        Self {
            boxes: "box.jpg".into(),
            ground: "grass.jpg".into(),
            orbiter: "ball2.jpg".into(),
        }
    }
}

/// Everything the viewer reads at startup.
#[derive(Clone, Debug)]
pub struct ViewerConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub technique: Technique,
    /// Edge length of the square offscreen depth target.
    pub shadow_map_size: u32,
    pub depth_bias: f32,
    pub asset_dir: PathBuf,
    pub textures: SceneTextures,
    pub cubemap: CubemapFaces,
    pub vsync: bool,
    pub navigation: NavigationConfig,
    pub logging: LoggingConfig,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            title: "duskview".to_string(),
            width: 512,
            height: 512,
            technique: Technique::default(),
            shadow_map_size: 1024,
            depth_bias: DEFAULT_DEPTH_BIAS,
            asset_dir: PathBuf::from("textures"),
            textures: SceneTextures::default(),
            cubemap: CubemapFaces::default(),
            vsync: true,
            navigation: NavigationConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl ViewerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn technique(mut self, technique: Technique) -> Self {
        self.technique = technique;
        self
    }

    pub fn shadow_map_size(mut self, size: u32) -> Self {
        self.shadow_map_size = size;
        self
    }

    pub fn depth_bias(mut self, bias: f32) -> Self {
        self.depth_bias = bias;
        self
    }

    pub fn asset_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.asset_dir = dir.into();
        self
    }

    pub fn textures(mut self, textures: SceneTextures) -> Self {
        self.textures = textures;
        self
    }

    pub fn cubemap(mut self, faces: CubemapFaces) -> Self {
        self.cubemap = faces;
        self
    }

    pub fn vsync(mut self, enabled: bool) -> Self {
        self.vsync = enabled;
        self
    }

    pub fn navigation(mut self, navigation: NavigationConfig) -> Self {
        self.navigation = navigation;
        self
    }

    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = logging;
        self
    }

    /// Resolve an asset file name against the asset directory.
    pub fn asset_path(&self, name: impl AsRef<Path>) -> PathBuf {
        self.asset_dir.join(name)
    }

    /// Build a config from command-line arguments (program name excluded).
    ///
    /// The first argument names the technique. The asset directory comes from
    /// the second argument, else from `env_assets`, else the default.
    pub fn from_args<I, S>(args: I, env_assets: Option<PathBuf>) -> Result<Self, String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut args = args.into_iter();
        let mut config = Self::default();

        if let Some(technique) = args.next() {
            config.technique = technique.as_ref().parse()?;
        }
        if let Some(dir) = args.next().map(|d| PathBuf::from(d.as_ref())).or(env_assets) {
            config.asset_dir = dir;
        }
        if let Some(extra) = args.next() {
            return Err(format!("unexpected argument '{}'", extra.as_ref()));
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_stock_scene() {
        let config = ViewerConfig::default();
        assert_eq!((config.width, config.height), (512, 512));
        assert_eq!(config.shadow_map_size, 1024);
        assert_eq!(config.depth_bias, 0.005);
        assert_eq!(config.textures.boxes, "box.jpg");
        assert_eq!(config.technique, Technique::ShadowMap);
    }

    #[test]
    fn builder_overrides_fields() {
        let config = ViewerConfig::new()
            .title("lamp")
            .size(1280, 720)
            .technique(Technique::RayCast)
            .shadow_map_size(2048)
            .depth_bias(0.001)
            .asset_dir("/srv/assets")
            .vsync(false);

        assert_eq!(config.title, "lamp");
        assert_eq!((config.width, config.height), (1280, 720));
        assert_eq!(config.technique, Technique::RayCast);
        assert_eq!(config.shadow_map_size, 2048);
        assert_eq!(config.depth_bias, 0.001);
        assert!(!config.vsync);
        assert_eq!(
            config.asset_path("box.jpg"),
            PathBuf::from("/srv/assets/box.jpg")
        );
    }

    #[test]
    fn technique_parses_from_cli_names() {
        assert_eq!("raycast".parse::<Technique>(), Ok(Technique::RayCast));
        assert_eq!("Shadow".parse::<Technique>(), Ok(Technique::ShadowMap));
        assert!("phong".parse::<Technique>().is_err());
    }

    #[test]
    fn args_pick_technique_and_assets() {
        let config = ViewerConfig::from_args(["raycast", "/data/tex"], None).unwrap();
        assert_eq!(config.technique, Technique::RayCast);
        assert_eq!(config.asset_dir, PathBuf::from("/data/tex"));

        let config = ViewerConfig::from_args(Vec::<String>::new(), None).unwrap();
        assert_eq!(config.technique, Technique::ShadowMap);
        assert_eq!(config.asset_dir, PathBuf::from("textures"));
    }

    #[test]
    fn argument_beats_environment() {
        let env = Some(PathBuf::from("/env/assets"));
        let config = ViewerConfig::from_args(["shadow"], env.clone()).unwrap();
        assert_eq!(config.asset_dir, PathBuf::from("/env/assets"));

        let config = ViewerConfig::from_args(["shadow", "local"], env).unwrap();
        assert_eq!(config.asset_dir, PathBuf::from("local"));
    }

    #[test]
    fn bad_arguments_are_rejected() {
        assert!(ViewerConfig::from_args(["phong"], None).is_err());
        assert!(ViewerConfig::from_args(["ray", "a", "b"], None).is_err());
    }

    #[test]
    fn technique_selects_navigation_basis() {
        assert_eq!(Technique::RayCast.navigation_basis(), NavigationBasis::RayCast);
        assert_eq!(Technique::ShadowMap.navigation_basis(), NavigationBasis::Raster);
    }
}
