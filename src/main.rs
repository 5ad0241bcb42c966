fn main() {
    if let Err(err) = plantuml_svg_patch::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
