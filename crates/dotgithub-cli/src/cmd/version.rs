use crate::output::print_json;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn run(json: bool) -> anyhow::Result<()> {
    if json {
        print_json(&serde_json::json!({ "version": VERSION }))?;
    } else {
        println!("{VERSION}");
    }
    Ok(())
}
