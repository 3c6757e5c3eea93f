fn main() -> anyhow::Result<()> {
    narrow_filter::run()
}
