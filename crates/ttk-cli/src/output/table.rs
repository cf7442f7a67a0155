//! Table formatting utilities for CLI output.

use comfy_table::{presets, ContentArrangement, Table};
use ttk::lexer::Token;

/// Format a token stream as a table of position, kind and literal.
pub fn format_token_table(tokens: &[Token]) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_BORDERS_ONLY);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Offset", "Kind", "Literal"]);

    for token in tokens {
        table.add_row(vec![
            token.position.to_string(),
            format!("{:?}", token.kind),
            token.literal.escape_debug().to_string(),
        ]);
    }

    table
}
