use super::{
    basics::{SCREEN_HEIGHT, SCREEN_WIDTH},
    vm::VirtualMachine,
};

pub const LIT: char = '@';
pub const DARK: char = ' ';

/// Renders the screen as one line per row, `@` for lit cells. Rows are
/// separated by newlines with no trailing newline.
pub fn render(vm: &VirtualMachine) -> String {
    let mut out = String::with_capacity((SCREEN_WIDTH as usize + 1) * SCREEN_HEIGHT as usize);
    for y in 0..SCREEN_HEIGHT {
        if y > 0 {
            out.push('\n');
        }
        for x in 0..SCREEN_WIDTH {
            out.push(if vm.screen_pixel(x, y) != 0 { LIT } else { DARK });
        }
    }
    out
}

pub fn draw_vm_display(vm: &VirtualMachine) {
    println!("{}", render(vm));
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_render_blank() {
        let vm = VirtualMachine::new();
        let out = render(&vm);
        let rows: Vec<&str> = out.split('\n').collect();
        assert_eq!(rows.len(), SCREEN_HEIGHT as usize);
        assert!(rows.iter().all(|row| row.len() == SCREEN_WIDTH as usize));
        assert!(!out.contains(LIT));
    }

    #[test]
    fn test_render_corners() {
        let mut vm = VirtualMachine::new();
        let screen = &mut vm.state_mut().screen;
        screen[0] = 0xFF;
        screen[63 + 31 * 64] = 0xFF;
        let out = render(&vm);
        let rows: Vec<&str> = out.split('\n').collect();
        assert!(rows[0].starts_with('@'));
        assert_eq!(rows[0].matches('@').count(), 1);
        assert!(rows[31].ends_with('@'));
    }
}
