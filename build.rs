fn main() {
    // ESP-IDF link arguments only matter when the espidf feature (and
    // therefore the esp toolchain) is in play; host test builds must
    // not touch the ESP-IDF sysenv.
    if std::env::var_os("CARGO_FEATURE_ESPIDF").is_some() {
        embuild::espidf::sysenv::output();
    }
}
