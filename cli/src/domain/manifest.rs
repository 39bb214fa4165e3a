//! Registry manifest parsing.

use serde::Deserialize;

/// Variant staged when an index publishes several for one architecture.
///
/// The installer maps `armv7l` hosts to `arm`, so `arm/v7` must win over
/// `arm/v6` regardless of the order the registry lists them in.
pub const PREFERRED_VARIANTS: &[(&str, &str)] = &[("arm", "v7"), ("arm64", "v8")];

/// One published platform of an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    pub architecture: String,
    pub variant: Option<String>,
}

impl Platform {
    #[must_use]
    pub fn new(architecture: &str, variant: Option<&str>) -> Self {
        Self {
            architecture: architecture.to_string(),
            variant: variant.map(str::to_string),
        }
    }

    fn is_preferred(&self) -> bool {
        PREFERRED_VARIANTS
            .iter()
            .any(|(arch, variant)| *arch == self.architecture && self.variant.as_deref() == Some(variant))
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.variant {
            Some(variant) => write!(f, "{}/{variant}", self.architecture),
            None => f.write_str(&self.architecture),
        }
    }
}

/// What a raw manifest says about platforms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestArchitectures {
    /// A manifest list / OCI index naming each published platform.
    List(Vec<Platform>),
    /// A single-architecture manifest; the platform lives in the image config.
    Single,
}

#[derive(Deserialize)]
struct RawManifest {
    #[serde(default)]
    manifests: Option<Vec<RawDescriptor>>,
}

#[derive(Deserialize)]
struct RawDescriptor {
    #[serde(default)]
    platform: Option<RawPlatform>,
}

#[derive(Deserialize)]
struct RawPlatform {
    architecture: String,
    #[serde(default)]
    variant: Option<String>,
}

#[derive(Deserialize)]
struct InspectOutput {
    #[serde(rename = "Architecture")]
    architecture: String,
    #[serde(rename = "Variant", default)]
    variant: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Parse the output of a raw manifest inspection.
///
/// `unknown` platforms (build attestations) are skipped. Each architecture
/// appears once: the first listed variant, unless a later one is in
/// [`PREFERRED_VARIANTS`].
///
/// # Errors
///
/// Returns an error if `raw` is not a JSON manifest.
pub fn parse_manifest(raw: &str) -> Result<ManifestArchitectures, serde_json::Error> {
    let manifest: RawManifest = serde_json::from_str(raw)?;
    let Some(descriptors) = manifest.manifests else {
        return Ok(ManifestArchitectures::Single);
    };
    let mut platforms: Vec<Platform> = Vec::new();
    for raw in descriptors.into_iter().filter_map(|d| d.platform) {
        if raw.architecture == "unknown" || raw.architecture.is_empty() {
            continue;
        }
        let platform = Platform {
            architecture: raw.architecture,
            variant: non_empty(raw.variant),
        };
        match platforms
            .iter_mut()
            .find(|p| p.architecture == platform.architecture)
        {
            Some(seen) if !seen.is_preferred() && platform.is_preferred() => *seen = platform,
            Some(_) => {}
            None => platforms.push(platform),
        }
    }
    Ok(ManifestArchitectures::List(platforms))
}

/// Parse the platform from a (non-raw) image inspection.
///
/// # Errors
///
/// Returns an error if the output has no `Architecture` field.
pub fn parse_inspect_platform(output: &str) -> Result<Platform, serde_json::Error> {
    let inspect: InspectOutput = serde_json::from_str(output)?;
    Ok(Platform {
        architecture: inspect.architecture,
        variant: non_empty(inspect.variant),
    })
}
