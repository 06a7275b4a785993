fn main() {
    // option_env!() values are cached unless cargo is told to watch them.
    println!("cargo:rerun-if-env-changed=ANON_LINK_API_KEY");
}
