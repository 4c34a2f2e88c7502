use std::fmt;

/// Dependency manifests understood by the security scan
#[derive(Clone, Copy, PartialEq, Eq, Debug, strum::Display, strum::EnumIter)]
pub enum ManifestKind {
    /// A JSON document with `dependencies` and `devDependencies` maps
    #[strum(to_string = "package.json")]
    PackageJson,
    /// A line-oriented list of requirements
    #[strum(to_string = "requirements.txt")]
    Requirements,
}

impl ManifestKind {
    /// The file name of this manifest
    pub fn file_name(&self) -> &'static str {
        match self {
            ManifestKind::PackageJson => "package.json",
            ManifestKind::Requirements => "requirements.txt",
        }
    }
}

/// A declared dependency, displayed as `name@version`
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Dependency {
    /// Package name
    pub name: String,
    /// Version or version requirement, if any
    pub version: Option<String>,
}

impl Dependency {
    /// Builds a new dependency
    pub fn new(name: impl Into<String>, version: Option<impl Into<String>>) -> Self {
        Self {
            name: name.into(),
            version: version.map(Into::into),
        }
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{}@{version}", self.name),
            None => f.write_str(&self.name),
        }
    }
}
