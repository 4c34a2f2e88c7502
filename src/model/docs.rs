use clap::ValueEnum;

/// Where the documentation content is read from
#[derive(ValueEnum, Clone, Copy, PartialEq, Eq, Debug, strum::Display, strum::EnumIter)]
pub enum DocsSource {
    /// The `package.json` on the working dir
    #[strum(to_string = "package.json")]
    PackageJson,
    /// Any source file
    #[strum(to_string = "Source file")]
    File,
    /// Text typed on the editor
    #[strum(to_string = "Manual input")]
    Manual,
}

/// The kind of documentation to generate
#[derive(ValueEnum, Clone, Copy, PartialEq, Eq, Debug, strum::Display, strum::EnumIter)]
pub enum DocsKind {
    /// A project README
    #[strum(to_string = "Project README")]
    Readme,
    /// Doc comments for every function
    #[strum(to_string = "Function docs")]
    Functions,
    /// Usage examples of an API
    #[strum(to_string = "API examples")]
    Api,
}

impl DocsKind {
    /// The user prompt for this kind of documentation
    pub fn prompt(&self, content: &str) -> String {
        let instructions = match self {
            DocsKind::Readme => "Create README with features, install, usage, config:",
            DocsKind::Functions => "Add doc comments to functions:",
            DocsKind::Api => "Create API usage examples:",
        };
        format!("{instructions}\n```\n{content}\n```")
    }

    /// The default file name to save this kind of documentation
    pub fn default_file_name(&self) -> &'static str {
        match self {
            DocsKind::Readme => "README.md",
            DocsKind::Functions => "DOCS.md",
            DocsKind::Api => "API.md",
        }
    }
}
