fn main() -> std::process::ExitCode {
    siteaudit_lib::run()
}
