fn main() {
    if let Err(err) = timesheet_loader::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
