use anyhow::Result;

fn main() -> Result<()> {
    modview_cli::main_entry()
}
