use vergen::EmitBuilder;

// Feeds `quotes --version` with the build time and commit.
fn main() {
    EmitBuilder::builder()
        .build_timestamp()
        .git_sha(true)
        .emit()
        .expect("Unable to generate the cargo keys!");
}
