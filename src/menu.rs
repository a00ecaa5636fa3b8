use std::io::{self, Write};

pub fn show_menu() -> io::Result<()> {
    println!("\n===========================================");
    println!("Finger Telemetry Dashboard");
    println!("===========================================");
    println!("Select an option:");
    println!("1. Live Session (controller link)");
    println!("2. Test Mode (offline simulation)");
    println!("3. Real-Time Dashboard (GUI)");
    println!("4. Exit");
    println!("===========================================");
    print!("Choice (1-4): ");
    io::stdout().flush()
}

pub fn get_user_choice() -> Result<u32, String> {
    let line = read_line().map_err(|e| e.to_string())?;
    line.trim().parse::<u32>().map_err(|e| e.to_string())
}

pub fn read_line() -> io::Result<String> {
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input)
}

pub fn wait_for_enter() -> io::Result<()> {
    println!("\nPress Enter to return to menu...");
    read_line().map(|_| ())
}
