use colored::Colorize;

pub fn handle() {
    println!("{}", "Programs:".bold());
    for program in stackflow::programs::all() {
        println!("  • {:16} {}", program.name().cyan(), program.description());
    }
}
