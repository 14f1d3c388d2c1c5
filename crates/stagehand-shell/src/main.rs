//! Demo binary: run the patrol scenario for a couple of seconds and print
//! the final kernel snapshot as JSON.

use std::error::Error;
use std::time::Duration;

use stagehand_kernel::manager::GameManager;
use stagehand_shell::{runner, scenario};

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let mut manager = GameManager::new("stagehand-demo");
    manager.set_statistics_interval(1.0);
    scenario::install(&mut manager, 42, 4)?;

    let shell = runner::spawn_loop(manager);
    std::thread::sleep(Duration::from_secs(2));

    match shell.latest_snapshot() {
        Some(snapshot) => println!("{}", serde_json::to_string_pretty(&snapshot)?),
        None => eprintln!("no snapshot published"),
    }

    shell.shutdown();
    Ok(())
}
