fn main() -> anyhow::Result<()> {
    scenebridge_host::launch()
}
