//! List command implementation

use viperflash_flash::available_transports;

/// List all transports built into this binary
pub fn list_transports() {
    println!("Supported transports:");
    println!();
    for info in available_transports() {
        let mut notes = Vec::new();
        if info.requires_root {
            notes.push("root");
        }
        if info.streaming {
            notes.push("streaming");
        }
        let notes = if notes.is_empty() {
            String::new()
        } else {
            format!(" [{}]", notes.join(", "))
        };
        println!("  {:<8} - {}{}", info.name, info.description, notes);
    }
}
