use crate::interaction::FeatureFlags;
use crate::theme::{SecurityLevel, Theme};
use crate::{Error, Result};
use serde::Deserialize;
use serde_json::{Map, Value};

/// Configuration object handed to the rendering engine before each render.
///
/// Engines take a loosely-typed JSON object (`{"theme": "dark", "securityLevel": "loose"}`), so
/// this wraps a [`Value`] with dotted-path accessors instead of modelling every engine knob.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig(Value);

impl Default for EngineConfig {
    fn default() -> Self {
        Self::empty_object()
    }
}

impl EngineConfig {
    pub fn empty_object() -> Self {
        Self(Value::Object(Map::new()))
    }

    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    /// Config the viewer applies for a render: theme, security posture, and no auto-start.
    pub fn for_viewer(theme: Theme, security: SecurityLevel) -> Self {
        let mut cfg = Self::empty_object();
        cfg.set_value("startOnLoad", Value::Bool(false));
        cfg.set_value("theme", Value::String(theme.engine_name().to_string()));
        cfg.set_value(
            "securityLevel",
            Value::String(security.as_str().to_string()),
        );
        cfg
    }

    pub fn get_str(&self, dotted_path: &str) -> Option<&str> {
        self.get(dotted_path)?.as_str()
    }

    pub fn get_bool(&self, dotted_path: &str) -> Option<bool> {
        self.get(dotted_path)?.as_bool()
    }

    fn get(&self, dotted_path: &str) -> Option<&Value> {
        let mut cur = &self.0;
        for segment in dotted_path.split('.') {
            cur = cur.as_object()?.get(segment)?;
        }
        Some(cur)
    }

    pub fn set_value(&mut self, dotted_path: &str, value: Value) {
        // `from_value` accepts any JSON value; coerce non-objects so this never panics.
        if !self.0.is_object() {
            self.0 = Value::Object(Map::new());
        }

        let Value::Object(ref mut root) = self.0 else {
            return;
        };
        let mut cur: &mut Map<String, Value> = root;
        let mut segments = dotted_path.split('.').peekable();
        while let Some(seg) = segments.next() {
            if segments.peek().is_none() {
                cur.insert(seg.to_string(), value);
                return;
            }
            let slot = cur.entry(seg).or_insert_with(|| Value::Object(Map::new()));
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            let Some(next) = slot.as_object_mut() else {
                return;
            };
            cur = next;
        }
    }

    pub fn deep_merge(&mut self, other: &Value) {
        deep_merge_value(&mut self.0, other);
    }
}

fn deep_merge_value(base: &mut Value, incoming: &Value) {
    match (base, incoming) {
        (Value::Object(base_map), Value::Object(in_map)) => {
            for (key, in_value) in in_map {
                match base_map.get_mut(key) {
                    Some(base_value) => deep_merge_value(base_value, in_value),
                    None => {
                        base_map.insert(key.clone(), in_value.clone());
                    }
                }
            }
        }
        (base_slot, in_value) => {
            *base_slot = in_value.clone();
        }
    }
}

/// Construction options supplied by the hosting page.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewerOptions {
    pub theme: Theme,
    pub enable_zoom: bool,
    pub enable_pan: bool,
    pub enable_export: bool,
    pub enable_fullscreen: bool,
    pub security_level: SecurityLevel,
    /// Pixel density multiplier for PNG export.
    pub raster_scale: f32,
    /// Upper bound on PNG rasterization before the export is abandoned.
    pub raster_timeout_ms: u64,
    /// Extra engine config merged over the viewer's own keys on every render.
    pub engine_overrides: Option<Value>,
}

impl Default for ViewerOptions {
    fn default() -> Self {
        Self {
            theme: Theme::Light,
            enable_zoom: true,
            enable_pan: true,
            enable_export: true,
            enable_fullscreen: true,
            security_level: SecurityLevel::Loose,
            raster_scale: 1.0,
            raster_timeout_ms: 10_000,
            engine_overrides: None,
        }
    }
}

impl ViewerOptions {
    pub fn from_json_str(text: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(text).map_err(|e| Error::InvalidOptions {
            message: e.to_string(),
        })?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.raster_scale.is_finite() && self.raster_scale > 0.0) {
            return Err(Error::InvalidOptions {
                message: format!("rasterScale must be positive, got {}", self.raster_scale),
            });
        }
        if self.raster_timeout_ms == 0 {
            return Err(Error::InvalidOptions {
                message: "rasterTimeoutMs must be non-zero".to_string(),
            });
        }
        Ok(())
    }

    pub fn features(&self) -> FeatureFlags {
        FeatureFlags {
            zoom: self.enable_zoom,
            pan: self.enable_pan,
            export: self.enable_export,
            fullscreen: self.enable_fullscreen,
        }
    }

    /// Engine config for a render with `theme`, including caller overrides.
    pub fn engine_config(&self, theme: Theme) -> EngineConfig {
        let mut cfg = EngineConfig::for_viewer(theme, self.security_level);
        if let Some(overrides) = &self.engine_overrides {
            cfg.deep_merge(overrides);
            // The viewer owns theme selection; overrides cannot pin a stale theme.
            cfg.set_value("theme", Value::String(theme.engine_name().to_string()));
        }
        cfg
    }
}
