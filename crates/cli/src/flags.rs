use clap::ValueEnum;
use modview_graph::OutputFormat;

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum FormatFlag {
    Json,
    Dot,
    Html,
}

impl FormatFlag {
    pub(crate) const fn as_domain(self) -> OutputFormat {
        match self {
            FormatFlag::Json => OutputFormat::Json,
            FormatFlag::Dot => OutputFormat::Dot,
            FormatFlag::Html => OutputFormat::Html,
        }
    }
}
