//! Build script for LoadingScreen.GUI
//! Embeds Windows resource metadata

fn main() {
    #[cfg(windows)]
    {
        let mut res = winresource::WindowsResource::new();
        res.set("FileDescription", "BepInEx loading progress splash screen");
        res.set("ProductName", "LoadingScreen");
        res.set("InternalName", "LoadingScreen.GUI");
        res.set("OriginalFilename", "LoadingScreen_GUI.exe");

        if let Err(e) = res.compile() {
            println!("cargo:warning=Failed to compile Windows resources: {}", e);
        }
    }
}
