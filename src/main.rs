fn main() {
    if let Err(err) = nested_circles::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
