fn main() -> anyhow::Result<()> {
    ecoenergy_lib::run()
}
