fn main() -> anyhow::Result<()> {
    tds_recon_cli::run(std::env::args())
}
