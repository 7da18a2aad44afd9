use clap::Parser;

/// This is an instant-runoff tabulation program.
#[derive(Parser, Debug, Clone, Default)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) The JSON file describing the election: the ballot files, the candidates
    /// and the rules. See the manual of the instant_runoff crate for the format.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path) A reference file containing the outcome of an election in JSON format. If provided, irvtally will
    /// check that the tabulated output matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path or 'stdout') If specified, the summary of the election will be written in JSON format to the given
    /// location. Setting this option overrides the output directory that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file or folder path) The file containing the ballots, or the folder of YAML ballot files. Setting this option overrides the sources that may be specified
    /// with the --config option.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (csv, xlsx, json or yaml) The type of the input. Defaults to yaml for a folder, otherwise to
    /// the extension of the input file, or csv.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// When using an Excel file, indicates the name of the worksheet to use. Defaults to the first worksheet.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    /// If passed as an argument, prints the table of every round and not only the final one.
    #[clap(long, takes_value = false)]
    pub show_intermediate: bool,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
