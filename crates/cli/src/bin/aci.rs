use anyhow::Result;

fn main() -> Result<()> {
    aci_cli::main_entry()
}
