fn main() {
    marea_sales_lib::run()
}
