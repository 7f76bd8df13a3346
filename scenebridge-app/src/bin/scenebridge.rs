fn main() -> anyhow::Result<()> {
    scenebridge_app::launch()
}
