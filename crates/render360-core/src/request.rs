//! Render requests and their wire payload.
//!
//! Raw form input is validated into a typed [`RenderRequest`], which is then
//! serialized into a flat, field-keyed JSON object passed to the renderer as
//! a single argument.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Model formats the driver script knows how to import.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["glb", "gltf", "blend", "fbx", "obj", "usd", "usdz", "usdc"];

/// Payload `mode` value for animation requests.
const ANIMATION_MODE: &str = "animation";

/// Form fields that can fail validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    SourceFile,
    Fps,
    Duration,
    Quality,
    Width,
    Height,
    Lighting,
    BackgroundColor,
}

impl FormField {
    /// Name of the field as it appears in the payload.
    pub fn key(self) -> &'static str {
        match self {
            FormField::SourceFile => "fileName",
            FormField::Fps => "fps",
            FormField::Duration => "duration",
            FormField::Quality => "quality",
            FormField::Width => "width",
            FormField::Height => "height",
            FormField::Lighting => "lighting",
            FormField::BackgroundColor => "backgroundColor",
        }
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A field-specific validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Missing { field: FormField },

    #[error("{field} must be a positive integer, got '{value}'")]
    NotPositiveInteger { field: FormField, value: String },

    #[error("{field}: '{value}' is not one of {allowed}")]
    UnknownChoice {
        field: FormField,
        value: String,
        allowed: String,
    },

    #[error("model file '{}' does not exist", .0.display())]
    SourceNotFound(PathBuf),

    #[error("unsupported model format '{}' (expected one of {})", .0.display(), SUPPORTED_EXTENSIONS.join(", "))]
    UnsupportedFormat(PathBuf),

    #[error("model path '{}' is not valid UTF-8", .0.display())]
    NonUtf8Path(PathBuf),

    #[error("payload is not a valid render request: {0}")]
    MalformedPayload(String),
}

impl ValidationError {
    /// The form field this error belongs to, if it belongs to one.
    pub fn field(&self) -> Option<FormField> {
        match self {
            ValidationError::Missing { field }
            | ValidationError::NotPositiveInteger { field, .. }
            | ValidationError::UnknownChoice { field, .. } => Some(*field),
            ValidationError::SourceNotFound(_)
            | ValidationError::UnsupportedFormat(_)
            | ValidationError::NonUtf8Path(_) => Some(FormField::SourceFile),
            ValidationError::MalformedPayload(_) => None,
        }
    }
}

/// Render quality preset understood by the driver script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Quality {
    Low,
    Medium,
    High,
}

impl Quality {
    pub const ALL: [Quality; 3] = [Quality::Low, Quality::Medium, Quality::High];

    pub fn as_str(self) -> &'static str {
        match self {
            Quality::Low => "Low",
            Quality::Medium => "Medium",
            Quality::High => "High",
        }
    }
}

/// Lighting rig, one of the lighting collections in the scene file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Lighting {
    Studio,
    Soft,
    Dramatic,
    Outdoor,
}

impl Lighting {
    pub const ALL: [Lighting; 4] = [
        Lighting::Studio,
        Lighting::Soft,
        Lighting::Dramatic,
        Lighting::Outdoor,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Lighting::Studio => "Studio",
            Lighting::Soft => "Soft",
            Lighting::Dramatic => "Dramatic",
            Lighting::Outdoor => "Outdoor",
        }
    }
}

/// Settings for an animated turntable render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimationSettings {
    pub fps: u32,
    pub duration_seconds: u32,
    pub quality: Quality,
    pub width: u32,
    pub height: u32,
    pub lighting: Lighting,
    pub background_color: String,
}

impl AnimationSettings {
    /// Total frames the renderer will produce.
    pub fn frame_count(&self) -> u64 {
        u64::from(self.fps) * u64::from(self.duration_seconds)
    }
}

/// What kind of output a request asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderMode {
    /// Single still frame for inspecting the model.
    Preview,
    /// Animated video.
    Animation(AnimationSettings),
}

/// A validated render request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRequest {
    pub source_file: PathBuf,
    pub mode: RenderMode,
}

/// Wire form of a request: a flat, field-keyed JSON object.
///
/// Preview requests carry only `fileName`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderPayload {
    pub file_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fps: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<Quality>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lighting: Option<Lighting>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
}

impl RenderRequest {
    /// Convert to the wire form.
    ///
    /// The payload is JSON text, so the source path must be valid UTF-8.
    pub fn to_payload(&self) -> Result<RenderPayload, ValidationError> {
        let file_name = utf8_path(&self.source_file)?.to_string();
        Ok(match &self.mode {
            RenderMode::Preview => RenderPayload {
                file_name,
                mode: None,
                fps: None,
                duration: None,
                quality: None,
                width: None,
                height: None,
                lighting: None,
                background_color: None,
            },
            RenderMode::Animation(anim) => RenderPayload {
                file_name,
                mode: Some(ANIMATION_MODE.to_string()),
                fps: Some(anim.fps),
                duration: Some(anim.duration_seconds),
                quality: Some(anim.quality),
                width: Some(anim.width),
                height: Some(anim.height),
                lighting: Some(anim.lighting),
                background_color: Some(anim.background_color.clone()),
            },
        })
    }

    /// Serialize to the single JSON argument handed to the renderer.
    pub fn to_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string(&self.to_payload()?)?)
    }

    /// Parse a payload produced by [`to_json`](Self::to_json).
    ///
    /// Checks the payload's structure and numbers only; the source file is
    /// not looked up on disk.
    pub fn from_json(json: &str) -> Result<Self, ValidationError> {
        let payload: RenderPayload = serde_json::from_str(json)
            .map_err(|e| ValidationError::MalformedPayload(e.to_string()))?;
        Self::try_from(payload)
    }

    /// The animation settings, when this is an animation request.
    pub fn animation(&self) -> Option<&AnimationSettings> {
        match &self.mode {
            RenderMode::Animation(anim) => Some(anim),
            RenderMode::Preview => None,
        }
    }
}

impl TryFrom<RenderPayload> for RenderRequest {
    type Error = ValidationError;

    fn try_from(payload: RenderPayload) -> Result<Self, Self::Error> {
        if payload.file_name.is_empty() {
            return Err(ValidationError::Missing { field: FormField::SourceFile });
        }
        let source_file = PathBuf::from(payload.file_name);

        match payload.mode.as_deref() {
            None => Ok(Self {
                source_file,
                mode: RenderMode::Preview,
            }),
            Some(ANIMATION_MODE) => {
                let anim = AnimationSettings {
                    fps: positive(FormField::Fps, payload.fps)?,
                    duration_seconds: positive(FormField::Duration, payload.duration)?,
                    quality: required(FormField::Quality, payload.quality)?,
                    width: positive(FormField::Width, payload.width)?,
                    height: positive(FormField::Height, payload.height)?,
                    lighting: required(FormField::Lighting, payload.lighting)?,
                    background_color: required(FormField::BackgroundColor, payload.background_color)?,
                };
                Ok(Self {
                    source_file,
                    mode: RenderMode::Animation(anim),
                })
            }
            Some(other) => Err(ValidationError::MalformedPayload(format!(
                "unknown mode '{other}'"
            ))),
        }
    }
}

fn required<T>(field: FormField, value: Option<T>) -> Result<T, ValidationError> {
    value.ok_or(ValidationError::Missing { field })
}

fn positive(field: FormField, value: Option<u32>) -> Result<u32, ValidationError> {
    match required(field, value)? {
        0 => Err(ValidationError::NotPositiveInteger {
            field,
            value: "0".to_string(),
        }),
        n => Ok(n),
    }
}

/// Raw values as collected by the UI.
#[derive(Debug, Clone, Default)]
pub struct FormValues {
    pub source_file: Option<PathBuf>,
    pub fps: String,
    pub duration: String,
    pub quality: String,
    pub width: String,
    pub height: String,
    pub lighting: String,
    pub background_color: String,
}

/// Validates form input into [`RenderRequest`]s.
pub struct RequestBuilder;

impl RequestBuilder {
    /// Build a preview request: just the model.
    pub fn preview(source_file: impl AsRef<Path>) -> Result<RenderRequest, ValidationError> {
        Ok(RenderRequest {
            source_file: validate_source(source_file.as_ref())?,
            mode: RenderMode::Preview,
        })
    }

    /// Build a full animation request from raw form values.
    ///
    /// Fields are checked in form order and the first failure is returned.
    pub fn build(form: &FormValues) -> Result<RenderRequest, ValidationError> {
        let source = form
            .source_file
            .as_deref()
            .ok_or(ValidationError::Missing { field: FormField::SourceFile })?;
        let source_file = validate_source(source)?;

        let anim = AnimationSettings {
            fps: parse_positive(FormField::Fps, &form.fps)?,
            duration_seconds: parse_positive(FormField::Duration, &form.duration)?,
            quality: parse_choice(FormField::Quality, &form.quality, &Quality::ALL, |q| q.as_str())?,
            width: parse_positive(FormField::Width, &form.width)?,
            height: parse_positive(FormField::Height, &form.height)?,
            lighting: parse_choice(FormField::Lighting, &form.lighting, &Lighting::ALL, |l| l.as_str())?,
            background_color: parse_background(&form.background_color)?,
        };

        Ok(RenderRequest {
            source_file,
            mode: RenderMode::Animation(anim),
        })
    }
}

fn validate_source(path: &Path) -> Result<PathBuf, ValidationError> {
    if path.as_os_str().is_empty() {
        return Err(ValidationError::Missing { field: FormField::SourceFile });
    }

    let supported = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|s| s.eq_ignore_ascii_case(ext))
        });
    if !supported {
        return Err(ValidationError::UnsupportedFormat(path.to_path_buf()));
    }

    if !path.is_file() {
        return Err(ValidationError::SourceNotFound(path.to_path_buf()));
    }

    // The renderer runs in the application directory, so hand it an absolute path.
    let absolute = path
        .canonicalize()
        .map_err(|_| ValidationError::SourceNotFound(path.to_path_buf()))?;
    utf8_path(&absolute)?;
    Ok(absolute)
}

fn utf8_path(path: &Path) -> Result<&str, ValidationError> {
    path.to_str()
        .ok_or_else(|| ValidationError::NonUtf8Path(path.to_path_buf()))
}

/// Digits only, as the input layer enforces; no sign, no whitespace.
fn parse_positive(field: FormField, raw: &str) -> Result<u32, ValidationError> {
    let not_positive = || ValidationError::NotPositiveInteger {
        field,
        value: raw.to_string(),
    };

    if raw.is_empty() {
        return Err(ValidationError::Missing { field });
    }
    if !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(not_positive());
    }

    match raw.parse::<u32>() {
        Ok(0) | Err(_) => Err(not_positive()),
        Ok(n) => Ok(n),
    }
}

fn parse_choice<T: Copy>(
    field: FormField,
    raw: &str,
    choices: &[T],
    name: impl Fn(T) -> &'static str,
) -> Result<T, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ValidationError::Missing { field });
    }

    choices
        .iter()
        .copied()
        .find(|&c| name(c) == raw)
        .ok_or_else(|| ValidationError::UnknownChoice {
            field,
            value: raw.to_string(),
            allowed: choices.iter().map(|&c| name(c)).collect::<Vec<_>>().join(", "),
        })
}

fn parse_background(raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Missing { field: FormField::BackgroundColor });
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn model(temp: &TempDir, name: &str) -> PathBuf {
        let path = temp.path().join(name);
        fs::write(&path, b"glTF").unwrap();
        path
    }

    fn form(source: PathBuf) -> FormValues {
        FormValues {
            source_file: Some(source),
            fps: "30".into(),
            duration: "5".into(),
            quality: "High".into(),
            width: "1920".into(),
            height: "1080".into(),
            lighting: "Studio".into(),
            background_color: "#000000".into(),
        }
    }

    #[test]
    fn test_preview_payload_has_only_file_name() {
        let temp = TempDir::new().unwrap();
        let request = RequestBuilder::preview(model(&temp, "model.glb")).unwrap();

        let value: serde_json::Value = serde_json::from_str(&request.to_json().unwrap()).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj.len(), 1);
        assert!(obj["fileName"].as_str().unwrap().ends_with("model.glb"));
    }

    #[test]
    fn test_animation_payload_fields() {
        let temp = TempDir::new().unwrap();
        let request = RequestBuilder::build(&form(model(&temp, "model.glb"))).unwrap();

        let value: serde_json::Value = serde_json::from_str(&request.to_json().unwrap()).unwrap();
        assert_eq!(value["mode"], "animation");
        assert_eq!(value["fps"], 30);
        assert_eq!(value["duration"], 5);
        assert_eq!(value["quality"], "High");
        assert_eq!(value["width"], 1920);
        assert_eq!(value["height"], 1080);
        assert_eq!(value["lighting"], "Studio");
        assert_eq!(value["backgroundColor"], "#000000");
        assert_eq!(value.as_object().unwrap().len(), 9);
    }

    #[test]
    fn test_round_trip_recovers_request() {
        let temp = TempDir::new().unwrap();
        let animation = RequestBuilder::build(&form(model(&temp, "model.glb"))).unwrap();
        let preview = RequestBuilder::preview(model(&temp, "chair.FBX")).unwrap();

        for request in [animation, preview] {
            let decoded = RenderRequest::from_json(&request.to_json().unwrap()).unwrap();
            assert_eq!(decoded, request);
        }
    }

    #[test]
    fn test_round_trip_presets_and_limits() {
        let temp = TempDir::new().unwrap();
        let source = model(&temp, "modèle 3d ✓.gltf");

        for quality in Quality::ALL {
            for lighting in Lighting::ALL {
                let mut values = form(source.clone());
                values.quality = quality.as_str().into();
                values.lighting = lighting.as_str().into();
                values.fps = "1".into();
                values.duration = u32::MAX.to_string();
                values.width = u32::MAX.to_string();
                values.height = u32::MAX.to_string();
                values.background_color = "rgb(10, 20, 30) \"quoted\"".into();

                let request = RequestBuilder::build(&values).unwrap();
                let anim = request.animation().unwrap();
                assert_eq!((anim.quality, anim.lighting), (quality, lighting));
                assert_eq!(anim.width, u32::MAX);

                let decoded = RenderRequest::from_json(&request.to_json().unwrap()).unwrap();
                assert_eq!(decoded, request);
            }
        }

        let preview = RequestBuilder::preview(&source).unwrap();
        assert!(preview.source_file.to_str().unwrap().ends_with("modèle 3d ✓.gltf"));
        let decoded = RenderRequest::from_json(&preview.to_json().unwrap()).unwrap();
        assert_eq!(decoded, preview);
    }

    #[cfg(unix)]
    #[test]
    fn test_rejects_non_utf8_source_path() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let temp = TempDir::new().unwrap();
        let path = temp.path().join(OsStr::from_bytes(b"mod\xffel.glb"));
        // Some filesystems refuse non-UTF-8 names outright.
        if fs::write(&path, b"glTF").is_err() {
            return;
        }

        let err = RequestBuilder::preview(&path).unwrap_err();
        assert!(matches!(err, ValidationError::NonUtf8Path(_)));
        assert_eq!(err.field(), Some(FormField::SourceFile));

        let request = RenderRequest {
            source_file: path,
            mode: RenderMode::Preview,
        };
        assert!(matches!(request.to_payload(), Err(ValidationError::NonUtf8Path(_))));
        assert!(matches!(
            request.to_json(),
            Err(crate::error::Error::Validation(ValidationError::NonUtf8Path(_)))
        ));
    }

    #[test]
    fn test_rejects_non_positive_or_non_numeric() {
        let temp = TempDir::new().unwrap();
        let source = model(&temp, "model.glb");

        for bad in ["0", "-5", "abc", "1.5", " 30", "+30", "99999999999", "３０"] {
            let mut values = form(source.clone());
            values.fps = bad.to_string();
            let err = RequestBuilder::build(&values).unwrap_err();
            assert_eq!(err.field(), Some(FormField::Fps), "input {bad:?}");
            assert!(matches!(err, ValidationError::NotPositiveInteger { .. }));
        }

        let mut values = form(source);
        values.height = String::new();
        assert_eq!(
            RequestBuilder::build(&values).unwrap_err(),
            ValidationError::Missing { field: FormField::Height }
        );
    }

    #[test]
    fn test_rejects_unknown_presets() {
        let temp = TempDir::new().unwrap();
        let mut values = form(model(&temp, "model.glb"));
        values.quality = "Ultra".into();

        let err = RequestBuilder::build(&values).unwrap_err();
        assert_eq!(err.field(), Some(FormField::Quality));
        assert!(err.to_string().contains("Low, Medium, High"));

        values.quality = "Low".into();
        values.lighting = "Disco".into();
        assert_eq!(RequestBuilder::build(&values).unwrap_err().field(), Some(FormField::Lighting));
    }

    #[test]
    fn test_source_file_checks() {
        let temp = TempDir::new().unwrap();

        let err = RequestBuilder::preview(model(&temp, "notes.txt")).unwrap_err();
        assert!(matches!(err, ValidationError::UnsupportedFormat(_)));

        let err = RequestBuilder::preview(temp.path().join("missing.obj")).unwrap_err();
        assert!(matches!(err, ValidationError::SourceNotFound(_)));

        let err = RequestBuilder::build(&FormValues::default()).unwrap_err();
        assert_eq!(err, ValidationError::Missing { field: FormField::SourceFile });
    }

    #[test]
    fn test_from_json_rejects_zero_and_partial_animation() {
        let zero = r#"{"fileName":"m.glb","mode":"animation","fps":0,"duration":5,"quality":"Low","width":2,"height":2,"lighting":"Soft","backgroundColor":"Black"}"#;
        assert_eq!(
            RenderRequest::from_json(zero).unwrap_err().field(),
            Some(FormField::Fps)
        );

        let partial = r#"{"fileName":"m.glb","mode":"animation","fps":24}"#;
        assert_eq!(
            RenderRequest::from_json(partial).unwrap_err(),
            ValidationError::Missing { field: FormField::Duration }
        );

        assert!(matches!(
            RenderRequest::from_json("[1,2]").unwrap_err(),
            ValidationError::MalformedPayload(_)
        ));
    }

    #[test]
    fn test_frame_count() {
        let temp = TempDir::new().unwrap();
        let request = RequestBuilder::build(&form(model(&temp, "model.glb"))).unwrap();
        assert_eq!(request.animation().unwrap().frame_count(), 150);
    }
}
