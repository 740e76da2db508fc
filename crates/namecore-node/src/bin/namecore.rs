fn main() -> namecore_node::Result<()> {
    namecore_node::run()
}
