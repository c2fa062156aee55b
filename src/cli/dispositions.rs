//! Dispositions command implementation

use crate::cli::output::{format_dispositions_json, format_dispositions_table, DispositionView};
use crate::cli::DispositionsArgs;
use crate::config::DispatchConfig;

/// Handle `dispatch dispositions` command
///
/// Shows the graph built from the config file when it exists, the standard
/// graph otherwise.
pub fn handle_dispositions(args: &DispositionsArgs) -> Result<String, Box<dyn std::error::Error>> {
    let config = if args.config.exists() {
        DispatchConfig::load(Some(&args.config))?
    } else {
        DispatchConfig::default()
    };
    let graph = config.transition_graph()?;
    let states = DispositionView::all(&graph);

    if args.json {
        Ok(format_dispositions_json(&states)?)
    } else {
        Ok(format_dispositions_table(&states))
    }
}
