fn main() {
    oasm::cli::run();
}
