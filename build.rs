fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Git metadata is optional: outside a checkout vergen emits defaults and warnings.
    vergen::EmitBuilder::builder()
        .git_sha(true)
        .git_branch()
        .emit()?;

    Ok(())
}
