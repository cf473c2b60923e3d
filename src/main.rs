fn main() -> anyhow::Result<()> {
    hand_link_lib::run()
}
