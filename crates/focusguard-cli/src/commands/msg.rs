/// Send a raw JSON message through the service handler and print the
/// response. Useful for driving the service the way a UI surface would.
pub fn run(message: &str) -> Result<(), Box<dyn std::error::Error>> {
    let svc = super::open_service()?;
    println!("{}", svc.handle_json(message));
    Ok(())
}
