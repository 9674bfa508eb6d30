//! Headless extraction: meshes a saddle quadric and writes it to `output.ply`.

use isofield::{EdgePlacement, ExtractParams, GridBounds, extract, field::Saddle, ply};

fn main() -> isofield::Result<()> {
    let params = ExtractParams::new(GridBounds::new(-5.5, 5.5, 0.1), -1.5)
        .with_placement(EdgePlacement::Interpolated);

    let mesh = extract(&Saddle, &params);
    ply::write_ply_file(&mesh, "output.ply")?;

    println!(
        "wrote output.ply: {} vertices, {} triangles",
        mesh.vertices.len(),
        mesh.triangle_count()
    );
    Ok(())
}
