/// Parse a TCP port for the renderer dev-server.
///
/// Port 0 is rejected: the host needs a concrete port to load its UI from.
pub fn parse_port(s: &str) -> Result<u16, String> {
    let port: u16 = s
        .trim()
        .parse()
        .map_err(|_| format!("Invalid port '{}': expected a number between 1 and 65535", s))?;

    if port == 0 {
        return Err("Port cannot be 0".to_string());
    }

    Ok(port)
}
