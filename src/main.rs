fn main() -> anyhow::Result<()> {
    options_margin_api::run()
}
